use strum::IntoEnumIterator;

/// Variant names of `T` joined for error messages, e.g. `"success, skip, error"`.
pub fn valid_csv<T>() -> String
where
    T: IntoEnumIterator + AsRef<str>,
{
    T::iter()
        .map(|v| v.as_ref().to_owned())
        .collect::<Vec<_>>()
        .join(", ")
}
