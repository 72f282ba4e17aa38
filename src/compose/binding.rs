//! Field binding
//!
//! Entity parsers describe the keys they understand as a list of [`Field`]
//! descriptors: the key, a typed slot in the record being built, and an
//! optional convert and validate step. [`bind_fields`] walks the list in
//! order against one YAML mapping and fills the slots.
//!
//! Binding a single field:
//!
//! 1. An absent or null key leaves the slot at its default.
//! 2. A convert error is reported under the field's key.
//! 3. A validate error is reported as is.
//! 4. Without a convert, the raw scalar must match the slot type,
//!    otherwise the error is `<key> should be type <type>`.

use crate::error::{ComposeError, ComposeResult};
use serde_yaml::{Mapping, Value};

/// Converts a raw YAML value into the value stored in a slot
pub type Convert<T> = fn(&Value) -> ComposeResult<T>;

/// Checks a value before it is stored
pub type Validate<T> = fn(&T) -> ComposeResult<()>;

/// Slot types a YAML scalar can be assigned to without conversion
pub trait Scalar: Sized {
    /// Name used in type mismatch errors
    const TYPE_NAME: &'static str;

    fn from_value(value: &Value) -> Option<Self>;
}

impl Scalar for String {
    const TYPE_NAME: &'static str = "string";

    fn from_value(value: &Value) -> Option<Self> {
        value.as_str().map(str::to_string)
    }
}

impl Scalar for bool {
    const TYPE_NAME: &'static str = "bool";

    fn from_value(value: &Value) -> Option<Self> {
        value.as_bool()
    }
}

impl Scalar for i64 {
    const TYPE_NAME: &'static str = "int";

    fn from_value(value: &Value) -> Option<Self> {
        value.as_i64()
    }
}

impl<T: Scalar> Scalar for Option<T> {
    const TYPE_NAME: &'static str = T::TYPE_NAME;

    fn from_value(value: &Value) -> Option<Self> {
        T::from_value(value).map(Some)
    }
}

enum Decode<T> {
    Assign {
        type_name: &'static str,
        from: fn(&Value) -> Option<T>,
    },
    Convert(Convert<T>),
}

/// One key of an input mapping bound to a typed slot
pub struct Field<'a, S, T = S> {
    key: &'static str,
    slot: &'a mut S,
    decode: Decode<T>,
    validate: Option<Validate<T>>,
}

impl<'a, S: Scalar> Field<'a, S> {
    /// Assign the raw scalar directly
    pub fn new(key: &'static str, slot: &'a mut S) -> Self {
        Self {
            key,
            slot,
            decode: Decode::Assign {
                type_name: S::TYPE_NAME,
                from: S::from_value,
            },
            validate: None,
        }
    }
}

impl<'a, S: From<T>, T> Field<'a, S, T> {
    /// Run `convert` on the raw value and store its result
    pub fn converted(key: &'static str, slot: &'a mut S, convert: Convert<T>) -> Self {
        Self {
            key,
            slot,
            decode: Decode::Convert(convert),
            validate: None,
        }
    }

    /// Check the (converted) value before storing it
    pub fn validate(mut self, validate: Validate<T>) -> Self {
        self.validate = Some(validate);
        self
    }

    pub fn boxed(self) -> Box<dyn Binding + 'a>
    where
        S: 'a,
        T: 'a,
    {
        Box::new(self)
    }
}

/// A descriptor that can be bound against a raw value
pub trait Binding {
    fn key(&self) -> &'static str;

    fn bind(&mut self, value: &Value) -> ComposeResult<()>;
}

impl<S: From<T>, T> Binding for Field<'_, S, T> {
    fn key(&self) -> &'static str {
        self.key
    }

    fn bind(&mut self, value: &Value) -> ComposeResult<()> {
        let value = match &self.decode {
            Decode::Assign { type_name, from } => {
                from(value).ok_or_else(|| ComposeError::mismatch(self.key, type_name))?
            }
            Decode::Convert(convert) => convert(value).map_err(|err| err.at(self.key))?,
        };

        if let Some(validate) = self.validate {
            validate(&value)?;
        }

        *self.slot = S::from(value);
        Ok(())
    }
}

/// Bind every field present in `mapping`, stopping at the first error.
///
/// Keys of `mapping` that no field names are ignored.
pub fn bind_fields(mapping: &Mapping, fields: Vec<Box<dyn Binding + '_>>) -> ComposeResult<()> {
    for mut field in fields {
        match mapping.get(field.key()) {
            None | Some(Value::Null) => continue,
            Some(value) => field.bind(value)?,
        }
    }
    Ok(())
}

/// Build a descriptor list for [`bind_fields`]
macro_rules! fields {
    ($($field:expr),* $(,)?) => {
        vec![$($field.boxed()),*]
    };
}

pub(crate) use fields;
