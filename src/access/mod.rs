mod scorer;

pub use scorer::AccessibilityScorer;
