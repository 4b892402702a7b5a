//! Explicit string conversion for stored values.
//!
//! Entries store values as text. Anything handed to the ledger is converted
//! through [`EntryValue`] at the API boundary:
//!
//! | input                      | stored as                      |
//! |----------------------------|--------------------------------|
//! | `str` / `String`           | the text itself                |
//! | integers, floats, `bool`   | their `Display` form           |
//! | `Option<T>`                | `None` -> null, else inner     |
//! | JSON string                | the string contents            |
//! | JSON number / bool         | their JSON text (`1.5`, `true`)|
//! | JSON null                  | null                           |
//! | JSON array / object        | compact JSON text (lossy)      |

/// Conversion of a caller value into a storable, nullable string.
pub trait EntryValue {
    fn to_entry_value(&self) -> Option<String>;
}

impl EntryValue for str {
    fn to_entry_value(&self) -> Option<String> {
        Some(self.to_string())
    }
}

impl EntryValue for String {
    fn to_entry_value(&self) -> Option<String> {
        Some(self.clone())
    }
}

impl<T: EntryValue + ?Sized> EntryValue for &T {
    fn to_entry_value(&self) -> Option<String> {
        (**self).to_entry_value()
    }
}

impl<T: EntryValue> EntryValue for Option<T> {
    fn to_entry_value(&self) -> Option<String> {
        self.as_ref().and_then(|value| value.to_entry_value())
    }
}

macro_rules! display_entry_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl EntryValue for $ty {
                fn to_entry_value(&self) -> Option<String> {
                    Some(self.to_string())
                }
            }
        )*
    };
}

display_entry_value!(bool, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64);

impl EntryValue for serde_json::Value {
    fn to_entry_value(&self) -> Option<String> {
        match self {
            serde_json::Value::Null => None,
            serde_json::Value::String(text) => Some(text.clone()),
            other => Some(other.to_string()),
        }
    }
}
