/// Converts an average on-time share (0.0–1.0) into a letter grade.
///
/// | Share       | Grade |
/// |-------------|-------|
/// | >= 0.95     | A+    |
/// | >= 0.90     | A     |
/// | >= 0.80     | B     |
/// | >= 0.65     | C     |
/// | >= 0.40     | D     |
/// | < 0.40      | F     |
pub fn grade(share: f64) -> &'static str {
    match share {
        s if s >= 0.95 => "A+",
        s if s >= 0.90 => "A",
        s if s >= 0.80 => "B",
        s if s >= 0.65 => "C",
        s if s >= 0.40 => "D",
        _ => "F",
    }
}
