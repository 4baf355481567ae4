use crate::datatype::LiteralValue;
use crate::matcher::Pass;
use crate::term::Term;

fn multiplier(unit: &str) -> Option<f64> {
    let factor = match unit.to_lowercase().as_str() {
        "b" | "byte" | "bytes" => 1.0,
        "kb" => 1e3,
        "mb" => 1e6,
        "gb" => 1e9,
        "tb" => 1e12,
        "kib" | "k" => 1024.0,
        "mib" | "m" => 1024.0 * 1024.0,
        "gib" | "g" => 1024.0 * 1024.0 * 1024.0,
        "tib" | "t" => 1024.0 * 1024.0 * 1024.0 * 1024.0,
        _ => return None,
    };
    Some(factor)
}

/// `%1 %2`: a number followed by a size unit, turned into a byte count.
pub struct FileSize;

impl Pass for FileSize {
    fn run(&self, captures: &[Term]) -> Vec<Term> {
        let value = match captures.first().and_then(Term::as_literal) {
            Some(LiteralValue::Integer(i)) => *i as f64,
            Some(LiteralValue::Double(d)) => *d,
            _ => return Vec::new(),
        };
        let Some(factor) = captures.get(1).and_then(Term::literal_str).and_then(multiplier) else {
            return Vec::new();
        };
        let bytes = (value * factor).round();
        if !bytes.is_finite() || bytes.abs() >= i64::MAX as f64 {
            return Vec::new();
        }
        vec![Term::literal(bytes as i64)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decimal_and_binary_units() {
        assert_eq!(FileSize.run(&[Term::literal(2), Term::literal("KiB")]), vec![Term::literal(2048)]);
        assert_eq!(FileSize.run(&[Term::literal(2), Term::literal("KB")]), vec![Term::literal(2000)]);
        assert_eq!(FileSize.run(&[Term::literal(2), Term::literal("K")]), vec![Term::literal(2048)]);
        assert_eq!(FileSize.run(&[Term::literal(1.5), Term::literal("mb")]), vec![Term::literal(1_500_000)]);
        assert!(FileSize.run(&[Term::literal(2), Term::literal("days")]).is_empty());
        assert!(FileSize.run(&[Term::literal("two"), Term::literal("kb")]).is_empty());
    }
}
