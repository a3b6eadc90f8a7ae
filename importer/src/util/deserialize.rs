use serde::{
    de::{self, IntoDeserializer, Visitor},
    Deserialize, Deserializer,
};
use std::{fmt, marker::PhantomData};

/// Deserialize a single item or an array, like `"cxx11-gcc-linux"` or
/// `["cxx11-gcc-linux", "c-gcc-linux"]`.
///
/// Legacy listings are not consistent about this, so fields holding lists of
/// strings accept both forms.
pub fn single_or_array<'de, TArr, TItem, D>(deserializer: D) -> Result<TArr, D::Error>
where
    TArr: Deserialize<'de> + Default + Extend<TItem>,
    TItem: Deserialize<'de>,
    D: Deserializer<'de>,
{
    fn create_t_arr<TArr, TItem>(item: TItem) -> TArr
    where
        TArr: Default + Extend<TItem>,
    {
        let mut arr = TArr::default();
        arr.extend([item]);
        arr
    }

    macro_rules! make_deserialize_primitive {
        ($ident:ident, $ty:ty) => {
            fn $ident<E>(self, v: $ty) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(create_t_arr(Deserialize::deserialize(
                    v.into_deserializer(),
                )?))
            }
        };
    }

    struct SingleOrArray<TArr, TItem>(PhantomData<fn() -> (TArr, TItem)>);

    impl<'de, TArr, TItem> Visitor<'de> for SingleOrArray<TArr, TItem>
    where
        TArr: Deserialize<'de> + Default + Extend<TItem>,
        TItem: Deserialize<'de>,
    {
        type Value = TArr;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("A single item or an array of items")
        }

        make_deserialize_primitive!(visit_bool, bool);
        make_deserialize_primitive!(visit_str, &str);
        make_deserialize_primitive!(visit_string, String);
        make_deserialize_primitive!(visit_i64, i64);
        make_deserialize_primitive!(visit_u64, u64);
        make_deserialize_primitive!(visit_f64, f64);

        fn visit_seq<A>(self, seq: A) -> Result<Self::Value, A::Error>
        where
            A: de::SeqAccess<'de>,
        {
            TArr::deserialize(de::value::SeqAccessDeserializer::new(seq))
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(TArr::default())
        }
    }

    deserializer.deserialize_any(SingleOrArray(PhantomData))
}

/// Deserialize a string, keeping numbers as their textual form.
///
/// Limits in legacy configs are written both as `2.5` and `"2.5"`; either way
/// the value is carried through untouched, so `2.0` stays `"2.0"`.
pub fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    struct StringOrNumber;

    impl<'de> Visitor<'de> for StringOrNumber {
        type Value = String;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a string or a number")
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(v.to_owned())
        }

        fn visit_string<E>(self, v: String) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(v)
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(v.to_string())
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(v.to_string())
        }

        fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            // `{:?}` keeps the trailing `.0` that `Display` drops
            Ok(format!("{:?}", v))
        }
    }

    deserializer.deserialize_any(StringOrNumber)
}
