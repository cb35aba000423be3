//! Flat, ordered field views of every parameter, key and sample type.
//!
//! A [`Fields`] value is the persistence contract: an ordered list of named
//! scalars, arrays and nested groups that a byte or text codec can write
//! without knowing the entity. `reconstruct` checks every element count
//! against the context before building the entity.
//!
//! Torus arrays are stored as the backend's `u64` words
//! ([`Torus::write_words`]); precisions are stored as their bit count.

use crate::bootstrap::{GateBootstrappingParameterSet, LweBootstrappingKey};
use crate::errors::TfheError;
use crate::lwe::{LweKey, LweKeySwitchKey, LweParams, LweSample};
use crate::tgsw::{TGswKey, TGswParams, TGswSample};
use crate::tlwe::{TLweKey, TLweParams, TLweSample};
use crate::torus::{ModulusParams, Torus};
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FormatError {
    #[error("Missing field `{name}`")]
    MissingField { name: String },

    #[error("Field `{name}` is not {expected}")]
    WrongKind { name: String, expected: &'static str },

    #[error("Field `{name}` holds {actual} elements, expected {expected}")]
    LengthMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },

    #[error("Field `{name}` is invalid: {message}")]
    InvalidValue { name: String, message: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Unsigned(u64),
    Real(f64),
    Bits(Vec<u8>),
    Words(Vec<u64>),
    Reals(Vec<f64>),
    Nested(Fields),
}

/// Ordered named fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fields {
    entries: Vec<(String, FieldValue)>,
}

impl Fields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a field, keeping insertion order.
    pub fn with(mut self, name: &str, value: FieldValue) -> Self {
        self.entries.push((name.to_string(), value));
        self
    }

    pub fn get(&self, name: &str) -> Result<&FieldValue, FormatError> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
            .ok_or_else(|| FormatError::MissingField {
                name: name.to_string(),
            })
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|(n, _)| n.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn unsigned(&self, name: &str) -> Result<u64, FormatError> {
        match self.get(name)? {
            FieldValue::Unsigned(v) => Ok(*v),
            _ => Err(wrong_kind(name, "an unsigned integer")),
        }
    }

    pub fn real(&self, name: &str) -> Result<f64, FormatError> {
        match self.get(name)? {
            FieldValue::Real(v) => Ok(*v),
            _ => Err(wrong_kind(name, "a real")),
        }
    }

    pub fn bits(&self, name: &str) -> Result<&[u8], FormatError> {
        match self.get(name)? {
            FieldValue::Bits(v) => Ok(v.as_slice()),
            _ => Err(wrong_kind(name, "a bit array")),
        }
    }

    pub fn words(&self, name: &str) -> Result<&[u64], FormatError> {
        match self.get(name)? {
            FieldValue::Words(v) => Ok(v.as_slice()),
            _ => Err(wrong_kind(name, "a word array")),
        }
    }

    pub fn reals(&self, name: &str) -> Result<&[f64], FormatError> {
        match self.get(name)? {
            FieldValue::Reals(v) => Ok(v.as_slice()),
            _ => Err(wrong_kind(name, "a real array")),
        }
    }

    pub fn nested(&self, name: &str) -> Result<&Fields, FormatError> {
        match self.get(name)? {
            FieldValue::Nested(v) => Ok(v),
            _ => Err(wrong_kind(name, "a field group")),
        }
    }

    fn size(&self, name: &str) -> Result<usize, FormatError> {
        let v = self.unsigned(name)?;
        usize::try_from(v).map_err(|_| invalid_value(name, format!("{v} does not fit in usize")))
    }

    fn small(&self, name: &str) -> Result<u32, FormatError> {
        let v = self.unsigned(name)?;
        u32::try_from(v).map_err(|_| invalid_value(name, format!("{v} does not fit in u32")))
    }

    /// A real that must be finite and non-negative, such as a variance.
    fn non_negative(&self, name: &str) -> Result<f64, FormatError> {
        let v = self.real(name)?;
        check_non_negative(name, v)?;
        Ok(v)
    }

    fn non_negative_reals(&self, name: &str) -> Result<&[f64], FormatError> {
        let values = self.reals(name)?;
        values
            .iter()
            .try_for_each(|&v| check_non_negative(name, v))?;
        Ok(values)
    }
}

fn check_non_negative(name: &str, v: f64) -> Result<(), FormatError> {
    if v.is_finite() && v >= 0.0 {
        Ok(())
    } else {
        Err(invalid_value(name, format!("{v} is not a non-negative real")))
    }
}

fn wrong_kind(name: &str, expected: &'static str) -> FormatError {
    FormatError::WrongKind {
        name: name.to_string(),
        expected,
    }
}

fn invalid_value(name: &str, message: impl Into<String>) -> FormatError {
    FormatError::InvalidValue {
        name: name.to_string(),
        message: message.into(),
    }
}

/// Maps a constructor error onto the field that carried the bad data.
fn rejected(name: &str) -> impl FnOnce(TfheError) -> FormatError + '_ {
    move |err| invalid_value(name, err.to_string())
}

fn check_len(name: &str, expected: usize, actual: usize) -> Result<(), FormatError> {
    if expected == actual {
        Ok(())
    } else {
        Err(FormatError::LengthMismatch {
            name: name.to_string(),
            expected,
            actual,
        })
    }
}

fn torus_words<T: Torus>(values: &[T]) -> FieldValue {
    let mut words = Vec::new();
    for v in values {
        v.write_words(&mut words);
    }
    FieldValue::Words(words)
}

fn read_torus<T: Torus>(
    fields: &Fields,
    name: &str,
    count: usize,
    precision: &T::Precision,
) -> Result<Vec<T>, FormatError> {
    let words = fields.words(name)?;
    let width = T::word_count(precision);
    check_len(name, count * width, words.len())?;
    words
        .chunks_exact(width)
        .map(|chunk| {
            T::read_words(chunk, precision)
                .ok_or_else(|| invalid_value(name, "word does not encode a torus element at this precision"))
        })
        .collect()
}

fn key_bits(bits: &[i32]) -> FieldValue {
    FieldValue::Bits(bits.iter().map(|&b| b as u8).collect())
}

fn read_key_bits(fields: &Fields, name: &str, count: usize) -> Result<Vec<i32>, FormatError> {
    let bits = fields.bits(name)?;
    check_len(name, count, bits.len())?;
    Ok(bits.iter().map(|&b| i32::from(b)).collect())
}

fn modulus_fields<T: Torus>(modulus: &ModulusParams<T>, fields: Fields) -> Fields {
    fields
        .with("precision_bits", FieldValue::Unsigned(u64::from(modulus.precision_bits())))
        .with("alpha_min", FieldValue::Real(modulus.alpha_min))
        .with("alpha_max", FieldValue::Real(modulus.alpha_max))
}

fn read_modulus<T: Torus>(fields: &Fields) -> Result<ModulusParams<T>, FormatError> {
    let bits = fields.small("precision_bits")?;
    let precision = T::precision_from_bits(bits)
        .ok_or_else(|| invalid_value("precision_bits", format!("{bits} bits unsupported by this backend")))?;
    ModulusParams::new(precision, fields.real("alpha_min")?, fields.real("alpha_max")?)
        .map_err(rejected("alpha_min"))
}

/// Conversion to and from [`Fields`].
///
/// `Context` carries what the flat form leaves out, typically the shared
/// parameters a key or sample was built against.
pub trait FieldView: Sized {
    type Context;

    fn flatten(&self) -> Fields;

    fn reconstruct(fields: &Fields, ctx: &Self::Context) -> Result<Self, FormatError>;
}

// ─── Parameters ─────────────────────────────────────────────────────────────

impl<T: Torus> FieldView for LweParams<T> {
    type Context = ();

    fn flatten(&self) -> Fields {
        let fields = Fields::new().with("n", FieldValue::Unsigned(self.n() as u64));
        modulus_fields(self.modulus(), fields)
    }

    fn reconstruct(fields: &Fields, _: &()) -> Result<Self, FormatError> {
        LweParams::new(fields.size("n")?, read_modulus(fields)?).map_err(rejected("n"))
    }
}

impl<T: Torus> FieldView for TLweParams<T> {
    type Context = ();

    fn flatten(&self) -> Fields {
        let fields = Fields::new()
            .with("degree", FieldValue::Unsigned(self.degree() as u64))
            .with("k", FieldValue::Unsigned(self.k() as u64));
        modulus_fields(self.modulus(), fields)
    }

    fn reconstruct(fields: &Fields, _: &()) -> Result<Self, FormatError> {
        TLweParams::new(fields.size("degree")?, fields.size("k")?, read_modulus(fields)?)
            .map_err(rejected("degree"))
    }
}

impl<T: Torus> FieldView for TGswParams<T> {
    type Context = ();

    fn flatten(&self) -> Fields {
        Fields::new()
            .with("l", FieldValue::Unsigned(self.l() as u64))
            .with("bgbit", FieldValue::Unsigned(u64::from(self.bgbit())))
            .with("tlwe", FieldValue::Nested(self.tlwe_params().flatten()))
    }

    fn reconstruct(fields: &Fields, _: &()) -> Result<Self, FormatError> {
        let tlwe = TLweParams::reconstruct(fields.nested("tlwe")?, &())?;
        TGswParams::new(fields.size("l")?, fields.small("bgbit")?, Arc::new(tlwe))
            .map_err(rejected("l"))
    }
}

impl<T: Torus> FieldView for GateBootstrappingParameterSet<T> {
    type Context = ();

    fn flatten(&self) -> Fields {
        Fields::new()
            .with("ks_t", FieldValue::Unsigned(self.ks_t() as u64))
            .with("ks_basebit", FieldValue::Unsigned(u64::from(self.ks_basebit())))
            .with("in_out", FieldValue::Nested(self.in_out_params().flatten()))
            .with("tgsw", FieldValue::Nested(self.tgsw_params().flatten()))
    }

    fn reconstruct(fields: &Fields, _: &()) -> Result<Self, FormatError> {
        let in_out = LweParams::reconstruct(fields.nested("in_out")?, &())?;
        let tgsw = TGswParams::reconstruct(fields.nested("tgsw")?, &())?;
        GateBootstrappingParameterSet::new(
            fields.size("ks_t")?,
            fields.small("ks_basebit")?,
            Arc::new(in_out),
            Arc::new(tgsw),
        )
        .map_err(rejected("ks_t"))
    }
}

// ─── Keys ───────────────────────────────────────────────────────────────────

impl<T: Torus> FieldView for LweKey<T> {
    type Context = Arc<LweParams<T>>;

    fn flatten(&self) -> Fields {
        Fields::new().with("key", key_bits(self.bits()))
    }

    fn reconstruct(fields: &Fields, params: &Self::Context) -> Result<Self, FormatError> {
        let bits = read_key_bits(fields, "key", params.n())?;
        LweKey::from_bits(params.clone(), bits).map_err(rejected("key"))
    }
}

impl<T: Torus> FieldView for TLweKey<T> {
    type Context = Arc<TLweParams<T>>;

    fn flatten(&self) -> Fields {
        Fields::new().with("key", key_bits(self.bits()))
    }

    fn reconstruct(fields: &Fields, params: &Self::Context) -> Result<Self, FormatError> {
        let bits = read_key_bits(fields, "key", params.k() * params.degree())?;
        TLweKey::from_bits(params.clone(), bits).map_err(rejected("key"))
    }
}

impl<T: Torus> FieldView for TGswKey<T> {
    type Context = Arc<TGswParams<T>>;

    fn flatten(&self) -> Fields {
        Fields::new().with("tlwe_key", FieldValue::Nested(self.tlwe_key().flatten()))
    }

    fn reconstruct(fields: &Fields, params: &Self::Context) -> Result<Self, FormatError> {
        let tlwe_key = TLweKey::reconstruct(fields.nested("tlwe_key")?, params.tlwe_params())?;
        TGswKey::from_tlwe_key(params.clone(), tlwe_key).map_err(rejected("tlwe_key"))
    }
}

// ─── Samples ────────────────────────────────────────────────────────────────

impl<T: Torus> FieldView for LweSample<T> {
    type Context = Arc<LweParams<T>>;

    fn flatten(&self) -> Fields {
        Fields::new()
            .with("a", torus_words(&self.a))
            .with("b", torus_words(std::slice::from_ref(&self.b)))
            .with("current_variance", FieldValue::Real(self.current_variance))
    }

    fn reconstruct(fields: &Fields, params: &Self::Context) -> Result<Self, FormatError> {
        let precision = params.precision();
        let a = read_torus(fields, "a", params.n(), precision)?;
        let b = read_torus(fields, "b", 1, precision)?[0];
        Ok(LweSample {
            a,
            b,
            current_variance: fields.non_negative("current_variance")?,
        })
    }
}

impl<T: Torus> FieldView for TLweSample<T> {
    type Context = Arc<TLweParams<T>>;

    fn flatten(&self) -> Fields {
        Fields::new()
            .with("data", torus_words(self.as_slice()))
            .with("current_variance", FieldValue::Real(self.current_variance))
    }

    fn reconstruct(fields: &Fields, params: &Self::Context) -> Result<Self, FormatError> {
        let data = read_torus(fields, "data", params.sample_len(), params.precision())?;
        TLweSample::from_data(data, fields.non_negative("current_variance")?, params)
            .map_err(rejected("data"))
    }
}

impl<T: Torus> FieldView for TGswSample<T> {
    type Context = Arc<TGswParams<T>>;

    fn flatten(&self) -> Fields {
        Fields::new()
            .with("data", torus_words(self.as_slice()))
            .with("variances", FieldValue::Reals(self.variances().to_vec()))
            .with("message_norm2", FieldValue::Real(self.message_norm2()))
    }

    fn reconstruct(fields: &Fields, params: &Self::Context) -> Result<Self, FormatError> {
        let data = read_torus(fields, "data", params.sample_len(), params.precision())?;
        let variances = fields.non_negative_reals("variances")?;
        check_len("variances", params.kpl(), variances.len())?;
        let message_norm2 = fields.non_negative("message_norm2")?;
        TGswSample::from_parts(data, variances.to_vec(), message_norm2, params)
            .map_err(rejected("data"))
    }
}

// ─── Evaluation keys ────────────────────────────────────────────────────────

/// Only the largest entry variance is kept; reconstruction assigns it to
/// every entry.
impl<T: Torus> FieldView for LweKeySwitchKey<T> {
    type Context = Arc<LweParams<T>>;

    fn flatten(&self) -> Fields {
        Fields::new()
            .with("input_dimension", FieldValue::Unsigned(self.input_dimension() as u64))
            .with("t", FieldValue::Unsigned(self.t() as u64))
            .with("basebit", FieldValue::Unsigned(u64::from(self.basebit())))
            .with("masks", torus_words(self.masks()))
            .with("bodies", torus_words(self.bodies()))
            .with("max_variance", FieldValue::Real(self.max_variance()))
    }

    fn reconstruct(fields: &Fields, out_params: &Self::Context) -> Result<Self, FormatError> {
        let input_dimension = fields.size("input_dimension")?;
        let t = fields.size("t")?;
        let basebit = fields.small("basebit")?;
        if basebit >= usize::BITS {
            return Err(invalid_value("basebit", format!("{basebit} is too wide")));
        }
        let entries = input_dimension
            .checked_mul(t)
            .and_then(|e| e.checked_mul(1usize << basebit))
            .ok_or_else(|| invalid_value("input_dimension", "entry count overflows"))?;
        let mask_count = entries
            .checked_mul(out_params.n())
            .ok_or_else(|| invalid_value("input_dimension", "entry count overflows"))?;

        let precision = out_params.precision();
        let masks = read_torus(fields, "masks", mask_count, precision)?;
        let bodies = read_torus(fields, "bodies", entries, precision)?;
        let variance = fields.non_negative("max_variance")?;
        LweKeySwitchKey::from_parts(
            input_dimension,
            t,
            basebit,
            out_params.clone(),
            masks,
            bodies,
            vec![variance; entries],
        )
        .map_err(rejected("basebit"))
    }
}

/// Only the largest TGSW row variance is kept, as for the key-switch key.
impl<T: Torus> FieldView for LweBootstrappingKey<T> {
    type Context = Arc<GateBootstrappingParameterSet<T>>;

    fn flatten(&self) -> Fields {
        Fields::new()
            .with("data", torus_words(self.as_slice()))
            .with("max_variance", FieldValue::Real(self.max_variance()))
            .with("key_switch", FieldValue::Nested(self.key_switch_key().flatten()))
    }

    fn reconstruct(fields: &Fields, params: &Self::Context) -> Result<Self, FormatError> {
        let tgsw = params.tgsw_params();
        let n = params.in_out_params().n();
        let data = read_torus(fields, "data", n * tgsw.sample_len(), params.precision())?;
        let variance = fields.non_negative("max_variance")?;
        let ks = LweKeySwitchKey::reconstruct(fields.nested("key_switch")?, params.in_out_params())?;
        LweBootstrappingKey::from_parts(params.clone(), data, vec![variance; n * tgsw.kpl()], ks)
            .map_err(rejected("key_switch"))
    }
}
