// not every test file uses every helper
#![allow(dead_code)]

// the reason this is named mod.rs has to do with some complexities of how
// testing is handled
//
// we are following the advice of the rust book
// https://doc.rust-lang.org/book/ch11-03-test-organization.html#submodules-in-integration-tests

// based on numpy!
// https://numpy.org/doc/stable/reference/generated/numpy.isclose.html
pub fn isclose(actual: f64, ref_val: f64, rtol: f64, atol: f64) -> bool {
    let actual_nan = actual.is_nan();
    let ref_nan = ref_val.is_nan();
    if actual_nan || ref_nan {
        actual_nan && ref_nan
    } else {
        (actual - ref_val).abs() <= (atol + rtol * ref_val.abs())
    }
}

// based on numpy's assert_allclose
pub fn assert_allclose(actual: &[f64], expected: &[f64], rtol: f64, atol: f64, context: &str) {
    assert_eq!(
        actual.len(),
        expected.len(),
        "{context}: the lengths of actual and expected are unequal"
    );
    for (i, (&a, &e)) in actual.iter().zip(expected).enumerate() {
        assert!(
            isclose(a, e, rtol, atol),
            "{context}: element {i} is {a}, expected {e} (rtol={rtol}, atol={atol})"
        );
    }
}

/// a point mass at `index` over `n_bins` bins
pub fn point_mass(n_bins: usize, index: usize) -> Vec<f64> {
    let mut out = vec![0.0; n_bins];
    out[index] = 1.0;
    out
}
