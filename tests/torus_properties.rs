use paste::paste;
use proptest::prelude::*;
use proptest::test_runner::TestCaseError;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use std::sync::Arc;
use toy_tfhe::tgsw::{decompose_coefficient, recompose};
use toy_tfhe::{
    BigPrecision, BigTorus, ModulusParams, NativeWidth, TGswParams, TLweParams, Torus, Torus32,
    Torus64,
};

fn pair<T: Torus>(precision: &T::Precision, seed: u64) -> (T, T) {
    let mut rng = ChaCha20Rng::seed_from_u64(seed);
    (T::uniform(precision, &mut rng), T::uniform(precision, &mut rng))
}

fn mod_switch_round_trip<T: Torus>(
    precision: &T::Precision,
    seed: u64,
    log_m: u32,
) -> Result<(), TestCaseError> {
    let (x, _) = pair::<T>(precision, seed);
    let m = 1u64 << log_m;
    let mu = x.mod_switch_from_torus(m, precision);
    prop_assert!(mu < m);
    let y = T::mod_switch_to_torus(mu, m, precision);
    prop_assert!(x.distance(&y, precision) <= 0.5 / m as f64 + 1e-15);
    prop_assert_eq!(x.approx_phase(m, precision), y);
    Ok(())
}

fn encoding_is_exact<T: Torus>(
    precision: &T::Precision,
    mu: u64,
    log_m: u32,
) -> Result<(), TestCaseError> {
    let m = 1u64 << log_m;
    let mu = mu % m;
    let x = T::mod_switch_to_torus(mu, m, precision);
    prop_assert_eq!(x.mod_switch_from_torus(m, precision), mu);
    prop_assert_eq!(x.approx_phase(m, precision), x);
    Ok(())
}

fn group_laws<T: Torus>(precision: &T::Precision, seed: u64, k: i64) -> Result<(), TestCaseError> {
    let (x, y) = pair::<T>(precision, seed);

    let mut z = x;
    z.add_assign(&y, precision);
    z.sub_assign(&y, precision);
    prop_assert_eq!(z, x);

    let mut z = x;
    z.add_assign(&x.neg(precision), precision);
    prop_assert_eq!(z, T::zero(precision));

    let mut scaled = x;
    scaled.add_mul_int(&y, k, precision);
    let mut repeated = x;
    for _ in 0..k.unsigned_abs() {
        if k >= 0 {
            repeated.add_assign(&y, precision);
        } else {
            repeated.sub_assign(&y, precision);
        }
    }
    prop_assert_eq!(scaled, repeated);
    Ok(())
}

fn words_round_trip<T: Torus>(precision: &T::Precision, seed: u64) -> Result<(), TestCaseError> {
    let (x, _) = pair::<T>(precision, seed);
    let mut words = Vec::new();
    x.write_words(&mut words);
    prop_assert_eq!(words.len(), T::word_count(precision));
    prop_assert_eq!(T::read_words(&words, precision), Some(x));
    Ok(())
}

fn decomposition_error_is_bounded<T: Torus>(
    precision: &T::Precision,
    seed: u64,
    l: usize,
    bgbit: u32,
) -> Result<(), TestCaseError> {
    let modulus = ModulusParams::new(precision.clone(), 0.0, 0.1).unwrap();
    let tlwe = Arc::new(TLweParams::new(8, 1, modulus).unwrap());
    let params = TGswParams::new(l, bgbit, tlwe).unwrap();
    let (x, _) = pair::<T>(precision, seed);

    let mut digits = vec![0i32; l];
    decompose_coefficient(&x, &params, &mut digits);
    let half = params.half_bg();
    prop_assert!(digits.iter().all(|&d| d > -half && d <= half));
    let err = recompose(&digits, &params).distance(&x, precision);
    prop_assert!(err <= params.epsilon() * (1.0 + 1e-9));
    Ok(())
}

macro_rules! torus_properties {
    ($($name:ident: $ty:ty = $precision:expr, gadget($l:expr, $bgbit:expr);)*) => {
        paste! {
            $(
            proptest! {
                #[test]
                fn [<mod_switch_round_trip_ $name>](seed in any::<u64>(), log_m in 1u32..16) {
                    mod_switch_round_trip::<$ty>(&$precision, seed, log_m)?;
                }

                #[test]
                fn [<encoding_is_exact_ $name>](mu in any::<u64>(), log_m in 1u32..20) {
                    encoding_is_exact::<$ty>(&$precision, mu, log_m)?;
                }

                #[test]
                fn [<group_laws_ $name>](seed in any::<u64>(), k in -6i64..6) {
                    group_laws::<$ty>(&$precision, seed, k)?;
                }

                #[test]
                fn [<words_round_trip_ $name>](seed in any::<u64>()) {
                    words_round_trip::<$ty>(&$precision, seed)?;
                }

                #[test]
                fn [<decomposition_error_is_bounded_ $name>](seed in any::<u64>()) {
                    decomposition_error_is_bounded::<$ty>(&$precision, seed, $l, $bgbit)?;
                }
            }
            )*
        }
    };
}

torus_properties! {
    torus32: Torus32 = NativeWidth, gadget(3, 7);
    torus64: Torus64 = NativeWidth, gadget(4, 10);
    big128: BigTorus<2> = BigPrecision::<2>::full(), gadget(5, 12);
    big100: BigTorus<2> = BigPrecision::<2>::new(100).unwrap(), gadget(4, 16);
    big256: BigTorus<4> = BigPrecision::<4>::new(200).unwrap(), gadget(6, 20);
}
