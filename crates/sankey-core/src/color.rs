use rustc_hash::FxHashMap;

/// Categorical color service.
///
/// Implementations must be deterministic: the same key always yields the same color for the
/// lifetime of the palette.
pub trait ColorPalette {
    fn get_color(&mut self, key: &str) -> String;
}

/// d3 `schemeTableau10`.
pub const SCHEME_TABLEAU10: [&str; 10] = [
    "#4e79a7", "#f28e2c", "#e15759", "#76b7b2", "#59a14f", "#edc949", "#af7aa1", "#ff9da7",
    "#9c755f", "#bab0ab",
];

/// Assigns palette entries to keys in first-request order, cycling when exhausted.
#[derive(Debug, Clone)]
pub struct DefaultColorPalette {
    palette: Vec<String>,
    mapping: FxHashMap<String, usize>,
}

impl Default for DefaultColorPalette {
    fn default() -> Self {
        Self::new(SCHEME_TABLEAU10.iter().map(|c| c.to_string()).collect())
    }
}

impl DefaultColorPalette {
    /// Falls back to [`SCHEME_TABLEAU10`] when `palette` is empty.
    pub fn new(palette: Vec<String>) -> Self {
        let palette = if palette.is_empty() {
            SCHEME_TABLEAU10.iter().map(|c| c.to_string()).collect()
        } else {
            palette
        };
        Self {
            palette,
            mapping: FxHashMap::default(),
        }
    }

    pub fn assigned(&self) -> usize {
        self.mapping.len()
    }
}

impl ColorPalette for DefaultColorPalette {
    fn get_color(&mut self, key: &str) -> String {
        let next = self.mapping.len();
        let idx = *self.mapping.entry(key.to_string()).or_insert(next);
        self.palette[idx % self.palette.len()].clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colors_are_stable_per_key_and_cycle() {
        let mut palette = DefaultColorPalette::new(vec!["#a".into(), "#b".into()]);
        assert_eq!(palette.get_color("x"), "#a");
        assert_eq!(palette.get_color("y"), "#b");
        assert_eq!(palette.get_color("z"), "#a");
        assert_eq!(palette.get_color("y"), "#b");
        assert_eq!(palette.assigned(), 3);
    }

    #[test]
    fn empty_palette_uses_tableau10() {
        let mut palette = DefaultColorPalette::new(Vec::new());
        assert_eq!(palette.get_color("first"), SCHEME_TABLEAU10[0]);
    }
}
