//! Custom classes available without registration: hash digests and a
//! column/row data frame.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

use sha1::Sha1;
use sha2::{Digest, Sha256};
use sha3::{Sha3_224, Sha3_256};

use super::registry::ClassRegistry;
use super::{CustomClass, ObjectError};
use crate::collections::Map;
use crate::native::NativeValue;

/// A digest function paired with the class tag its results are stored under.
pub trait HashAlgorithm: 'static {
    const NAME: &'static str;
    const CLASS_TAG: &'static str;
    const DESCRIPTOR: &'static str;

    fn hash(data: &[u8]) -> Vec<u8>;
}

macro_rules! hash_algorithm {
    ($marker:ident, $alias:ident, $tag:expr, $descr:expr, |$data:ident| $body:expr) => {
        #[doc = concat!("Marker for [`", stringify!($alias), "`].")]
        #[derive(Debug)]
        pub enum $marker {}

        impl HashAlgorithm for $marker {
            const NAME: &'static str = stringify!($alias);
            const CLASS_TAG: &'static str = $tag;
            const DESCRIPTOR: &'static str = $descr;

            fn hash($data: &[u8]) -> Vec<u8> {
                $body
            }
        }

        #[doc = concat!("Serializable ", $descr, ", class tag `", $tag, "`.")]
        pub type $alias = HashDigest<$marker>;
    };
}

hash_algorithm!(Sha3_224Algorithm, HashSha3_224, "#", "SHA3-224 hash (digest)", |data| {
    Sha3_224::digest(data).to_vec()
});
hash_algorithm!(Sha1Algorithm, HashSha1, "#1", "SHA1 hash (digest)", |data| {
    Sha1::digest(data).to_vec()
});
hash_algorithm!(Sha256Algorithm, HashSha256, "#2", "SHA-256 hash (digest)", |data| {
    Sha256::digest(data).to_vec()
});
hash_algorithm!(Sha3_256Algorithm, HashSha3_256, "#3", "SHA3-256 hash (digest)", |data| {
    Sha3_256::digest(data).to_vec()
});
hash_algorithm!(Md5Algorithm, HashMd5, "#5", "MD5 hash (digest)", |data| {
    md5::Md5::digest(data).to_vec()
});
hash_algorithm!(Crc32Algorithm, HashCrc32, "#0", "CRC32 hash (digest)", |data| {
    crc32fast::hash(data).to_be_bytes().to_vec()
});

/// A stored digest. Serializes as `[digest]`, or `[null]` while empty.
pub struct HashDigest<A> {
    digest: Option<Vec<u8>>,
    algorithm: PhantomData<A>,
}

impl<A: HashAlgorithm> HashDigest<A> {
    /// Hashes `data`.
    pub fn from_data(data: &[u8]) -> Self {
        Self::from_digest(A::hash(data))
    }

    /// Wraps an already computed digest.
    pub fn from_digest(digest: impl Into<Vec<u8>>) -> Self {
        Self {
            digest: Some(digest.into()),
            algorithm: PhantomData,
        }
    }

    pub fn digest(&self) -> Option<&[u8]> {
        self.digest.as_deref()
    }
}

impl<A> Default for HashDigest<A> {
    fn default() -> Self {
        Self {
            digest: None,
            algorithm: PhantomData,
        }
    }
}

impl<A> Clone for HashDigest<A> {
    fn clone(&self) -> Self {
        Self {
            digest: self.digest.clone(),
            algorithm: PhantomData,
        }
    }
}

impl<A> PartialEq for HashDigest<A> {
    fn eq(&self, other: &Self) -> bool {
        self.digest == other.digest
    }
}

impl<A> Eq for HashDigest<A> {}

impl<A: HashAlgorithm> Hash for HashDigest<A> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        A::CLASS_TAG.hash(state);
        self.digest.hash(state);
    }
}

impl<A: HashAlgorithm> fmt::Debug for HashDigest<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.digest {
            Some(digest) => write!(f, "{}({})", A::NAME, hex::encode(digest)),
            None => write!(f, "{}()", A::NAME),
        }
    }
}

impl<A: HashAlgorithm> fmt::Display for HashDigest<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl<A: HashAlgorithm> CustomClass for HashDigest<A> {
    const CLASS_TAG: &'static str = A::CLASS_TAG;
    const DESCRIPTOR: Option<&'static str> = Some(A::DESCRIPTOR);

    fn class_name() -> &'static str {
        A::NAME
    }

    fn values(&self) -> Vec<NativeValue> {
        match &self.digest {
            Some(digest) => vec![NativeValue::Bytes(digest.clone())],
            None => vec![NativeValue::Null],
        }
    }

    fn set_values(&mut self, values: Vec<NativeValue>) -> Result<(), ObjectError> {
        let mut values = values.into_iter();
        self.digest = match (values.next(), values.next()) {
            (Some(NativeValue::Bytes(digest)), None) => Some(digest),
            (Some(NativeValue::Null), None) => None,
            _ => {
                return Err(ObjectError::new(format!(
                    "{} expects a single digest value",
                    A::NAME
                )))
            }
        };
        Ok(())
    }
}

/// Tabular data as column names plus rows of field values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataFrameSerialized {
    columns: Vec<NativeValue>,
    rows: Vec<Vec<NativeValue>>,
}

impl DataFrameSerialized {
    /// Fails unless every row has exactly one value per column.
    pub fn new(
        columns: Vec<NativeValue>,
        rows: Vec<Vec<NativeValue>>,
    ) -> Result<Self, ObjectError> {
        if let Some(idx) = rows.iter().position(|row| row.len() != columns.len()) {
            return Err(ObjectError::new(format!(
                "row {idx} has {} values for {} columns",
                rows[idx].len(),
                columns.len()
            )));
        }
        Ok(Self { columns, rows })
    }

    pub fn columns(&self) -> &[NativeValue] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<NativeValue>] {
        &self.rows
    }

    /// `{column: [value of each row], ...}`
    pub fn columns_data(&self) -> Map<NativeValue> {
        self.columns
            .iter()
            .enumerate()
            .map(|(idx, column)| {
                let cells = self.rows.iter().map(|row| row[idx].clone()).collect();
                (column.clone(), NativeValue::list(cells))
            })
            .collect()
    }

    /// `[{column: value, ...}, ...]`, one map per row.
    pub fn rows_data(&self) -> Vec<Map<NativeValue>> {
        self.rows
            .iter()
            .map(|row| self.columns.iter().cloned().zip(row.iter().cloned()).collect())
            .collect()
    }
}

impl CustomClass for DataFrameSerialized {
    const CLASS_TAG: &'static str = "df";
    const DESCRIPTOR: Option<&'static str> = Some("DataFrame (columns, data)");

    fn values(&self) -> Vec<NativeValue> {
        let rows = self
            .rows
            .iter()
            .map(|row| NativeValue::list(row.clone()))
            .collect();
        vec![NativeValue::list(self.columns.clone()), NativeValue::list(rows)]
    }

    fn set_values(&mut self, values: Vec<NativeValue>) -> Result<(), ObjectError> {
        let [columns, data] = <[NativeValue; 2]>::try_from(values)
            .map_err(|_| ObjectError::new("expected columns and data"))?;
        let columns = columns
            .sequence_items()
            .ok_or_else(|| ObjectError::new("columns must be a list"))?;
        let rows = data
            .sequence_items()
            .ok_or_else(|| ObjectError::new("data must be a list of rows"))?
            .iter()
            .map(|row| {
                row.sequence_items()
                    .ok_or_else(|| ObjectError::new("each row must be a list"))
            })
            .collect::<Result<Vec<_>, _>>()?;
        *self = Self::new(columns, rows)?;
        Ok(())
    }
}

fn register_builtin<T: CustomClass>(registry: &mut ClassRegistry) {
    if let Err(err) = registry.register::<T>() {
        tracing::warn!(%err, "built-in class not registered");
    }
}

pub(crate) fn register_all(registry: &mut ClassRegistry) {
    register_builtin::<HashSha3_224>(registry);
    register_builtin::<HashSha1>(registry);
    register_builtin::<HashSha256>(registry);
    register_builtin::<HashSha3_256>(registry);
    register_builtin::<HashMd5>(registry);
    register_builtin::<HashCrc32>(registry);
    register_builtin::<DataFrameSerialized>(registry);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn hex_digest<A: HashAlgorithm>(data: &[u8]) -> String {
        hex::encode(HashDigest::<A>::from_data(data).digest().unwrap())
    }

    #[test]
    fn known_digests() {
        let cases: [(&str, String); 6] = [
            ("d8932aac", hex_digest::<Crc32Algorithm>(b"hi")),
            ("49f68a5c8493ec2c0bf489821c21fc3b", hex_digest::<Md5Algorithm>(b"hi")),
            (
                "c22b5f9178342609428d6f51b2c5af4c0bde6a42",
                hex_digest::<Sha1Algorithm>(b"hi"),
            ),
            (
                "8f434346648f6b96df89dda901c5176b10a6d83961dd3c1ac88b59b2dc327aa4",
                hex_digest::<Sha256Algorithm>(b"hi"),
            ),
            (
                "4538aacc6ccae167eb462bd2d6ced3537edf6f8d88af709be7b130c0",
                hex_digest::<Sha3_224Algorithm>(b"hi"),
            ),
            (
                "b39c14c8da3b23811f6415b7e0b33526d7e07a46f2cf0484179435767e4a8804",
                hex_digest::<Sha3_256Algorithm>(b"hi"),
            ),
        ];
        for (expected, actual) in cases {
            assert_eq!(actual, expected);
        }
    }

    #[test]
    fn hashes_compare_by_digest() {
        let mut seen = HashSet::new();
        seen.insert(HashMd5::from_data(b"a"));
        assert!(seen.contains(&HashMd5::from_data(b"a")));
        assert!(!seen.contains(&HashMd5::from_data(b"b")));
        assert_eq!(HashSha1::from_digest(vec![1, 2]), HashSha1::from_digest([1, 2]));
    }

    #[test]
    fn hash_debug_and_name() {
        assert_eq!(
            format!("{:?}", HashCrc32::from_data(b"hi")),
            "HashCrc32(d8932aac)"
        );
        assert_eq!(format!("{}", HashSha256::default()), "HashSha256()");
        assert_eq!(<HashSha3_224 as CustomClass>::class_name(), "HashSha3_224");
    }

    #[test]
    fn hash_values_round_trip() {
        let hash = HashSha256::from_data(b"hi");
        let mut restored = HashSha256::default();
        CustomClass::set_values(&mut restored, CustomClass::values(&hash)).unwrap();
        assert_eq!(restored, hash);

        let mut empty = HashSha256::default();
        assert_eq!(CustomClass::values(&empty), vec![NativeValue::Null]);
        CustomClass::set_values(&mut empty, vec![NativeValue::Null]).unwrap();
        assert!(empty.digest().is_none());
        assert!(CustomClass::set_values(&mut empty, vec![1.into()]).is_err());
        assert!(CustomClass::set_values(&mut empty, vec![]).is_err());
    }

    fn sample_frame() -> DataFrameSerialized {
        DataFrameSerialized::new(
            vec!["a".into(), "b".into()],
            vec![vec![1.into(), "x".into()], vec![2.into(), "y".into()]],
        )
        .unwrap()
    }

    #[test]
    fn data_frame_views() {
        let frame = sample_frame();
        let columns = frame.columns_data();
        assert_eq!(
            columns.get(&"a".into()),
            Some(&NativeValue::list(vec![1.into(), 2.into()]))
        );
        let rows = frame.rows_data();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].get(&"b".into()), Some(&"y".into()));
        assert!(DataFrameSerialized::default().columns_data().is_empty());
    }

    #[test]
    fn data_frame_validates_rows() {
        let err = DataFrameSerialized::new(vec!["a".into()], vec![vec![]]).unwrap_err();
        assert_eq!(err.to_string(), "row 0 has 0 values for 1 columns");

        let frame = sample_frame();
        let mut restored = DataFrameSerialized::default();
        CustomClass::set_values(&mut restored, CustomClass::values(&frame)).unwrap();
        assert_eq!(restored, frame);
        assert!(CustomClass::set_values(&mut restored, vec![NativeValue::Null]).is_err());
        assert!(CustomClass::set_values(
            &mut restored,
            vec![NativeValue::list(vec![]), NativeValue::list(vec![1.into()])]
        )
        .is_err());
    }
}
