use std::fmt;
use std::marker::PhantomData;

use serde::de::{Deserializer, SeqAccess, Visitor};
use serde::ser::SerializeSeq;
use serde::{Deserialize, Serialize, Serializer};

use crate::{ConcurrentSet, Minimum};

impl<K, const LOCAL_GC_BUFFER_SIZE: usize> Serialize for ConcurrentSet<K, LOCAL_GC_BUFFER_SIZE>
where
    K: 'static + Serialize + Copy + Minimum + Ord + Send + Sync,
{
    fn serialize<S>(&self, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        // `len` lags concurrent mutations, so take the length
        // from a single pass instead.
        let keys: Vec<K> = self.iter().collect();
        let mut seq = s.serialize_seq(Some(keys.len()))?;
        for key in &keys {
            seq.serialize_element(key)?;
        }
        seq.end()
    }
}

struct ConcurrentSetVisitor<K, const LOCAL_GC_BUFFER_SIZE: usize> {
    pd: PhantomData<K>,
}

impl<'de, K, const LOCAL_GC_BUFFER_SIZE: usize> Visitor<'de>
    for ConcurrentSetVisitor<K, LOCAL_GC_BUFFER_SIZE>
where
    K: 'static + Deserialize<'de> + Copy + Minimum + Ord + Send + Sync,
{
    type Value = ConcurrentSet<K, LOCAL_GC_BUFFER_SIZE>;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a sequence of set keys")
    }

    fn visit_seq<A>(self, mut access: A) -> Result<Self::Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let set = ConcurrentSet::default();

        while let Some(key) = access.next_element()? {
            set.insert(key);
        }

        Ok(set)
    }
}

impl<'de, K, const LOCAL_GC_BUFFER_SIZE: usize> Deserialize<'de>
    for ConcurrentSet<K, LOCAL_GC_BUFFER_SIZE>
where
    K: 'static + Deserialize<'de> + Copy + Minimum + Ord + Send + Sync,
{
    fn deserialize<D>(d: D) -> Result<ConcurrentSet<K, LOCAL_GC_BUFFER_SIZE>, D::Error>
    where
        D: Deserializer<'de>,
    {
        d.deserialize_seq(ConcurrentSetVisitor { pd: PhantomData })
    }
}
