pub trait Factorial {
    fn get(&self, n: u8) -> f64;
}

/// Largest `n` whose factorial is representable as a finite `f64`.
pub const MAX_N: u8 = 170;

#[derive(Default)]
pub struct Calculator;

impl Factorial for Calculator {
    #[inline]
    fn get(&self, n: u8) -> f64 {
        assert!(n <= MAX_N, "{n}! overflows");
        (2..=n).map(f64::from).product()
    }
}

pub struct Lookup {
    entries: Vec<f64>,
}
impl Factorial for Lookup {
    #[inline]
    fn get(&self, n: u8) -> f64 {
        assert!(n <= MAX_N, "{n}! overflows");
        self.entries[n as usize]
    }
}

impl Default for Lookup {
    fn default() -> Self {
        let mut entries = vec![1.0; MAX_N as usize + 1];
        for n in 2..entries.len() {
            entries[n] = n as f64 * entries[n - 1];
        }
        Self { entries }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    pub fn calculator() {
        test_impl(Calculator);
    }

    #[test]
    pub fn lookup() {
        test_impl(Lookup::default());
    }

    fn test_impl(f: impl Factorial) {
        assert_eq!(1.0, f.get(0));
        assert_eq!(1.0, f.get(1));
        assert_eq!(2.0, f.get(2));
        assert_eq!(6.0, f.get(3));
        assert_eq!(24.0, f.get(4));
        assert_eq!(3_628_800.0, f.get(10));
        assert!(f.get(MAX_N).is_finite());
    }

    #[test]
    #[should_panic = "171! overflows"]
    fn overflow() {
        Lookup::default().get(171);
    }
}
