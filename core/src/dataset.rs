//! The data set: an ordered mapping from attribute tags to data
//! elements, iterated in ascending tag order.

use crate::element::DataElement;
use crate::header::Tag;
use snafu::{OptionExt, Snafu};
use std::collections::{btree_map, BTreeMap, BTreeSet};

/// An ordered set of attribute tags, as passed to partial reads to name
/// the elements to skip.
pub type TagSet = BTreeSet<Tag>;

/// An error raised when looking up an attribute absent from a data set.
#[derive(Debug, Snafu, Clone, PartialEq)]
#[snafu(display("no data element {} in data set", tag))]
pub struct TagNotFound {
    /// the tag that was looked up
    pub tag: Tag,
}

/// An ordered collection of data elements keyed by their tags.
///
/// Keys are unique and iteration always yields elements in ascending
/// tag order, independently of insertion order. Lookups never fall back
/// to a default: a miss is either a `false` from [`contains`] or a
/// [`TagNotFound`] from [`element`].
///
/// [`contains`]: Self::contains
/// [`element`]: Self::element
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataSet {
    entries: BTreeMap<Tag, DataElement>,
}

impl DataSet {
    /// Create a new empty data set.
    pub fn new() -> Self {
        DataSet::default()
    }

    /// Check whether an element with the given tag exists.
    pub fn contains(&self, tag: Tag) -> bool {
        self.entries.contains_key(&tag)
    }

    /// Retrieve the data element with the given tag.
    pub fn element(&self, tag: Tag) -> Result<&DataElement, TagNotFound> {
        self.entries.get(&tag).context(TagNotFoundSnafu { tag })
    }

    /// Retrieve the data element with the given tag for mutation.
    ///
    /// The element's tag itself is not exposed for change,
    /// so the map stays consistent.
    pub fn element_mut(&mut self, tag: Tag) -> Result<&mut DataElement, TagNotFound> {
        self.entries.get_mut(&tag).context(TagNotFoundSnafu { tag })
    }

    /// Insert a data element, replacing (and returning) any previous
    /// element of the same attribute.
    pub fn put(&mut self, elem: DataElement) -> Option<DataElement> {
        self.entries.insert(elem.tag(), elem)
    }

    /// Remove the element with the given tag,
    /// reporting whether it was present.
    pub fn remove(&mut self, tag: Tag) -> bool {
        self.entries.remove(&tag).is_some()
    }

    /// Remove and return the element with the given tag.
    pub fn take(&mut self, tag: Tag) -> Result<DataElement, TagNotFound> {
        self.entries.remove(&tag).context(TagNotFoundSnafu { tag })
    }

    /// Iterate over the elements in ascending tag order.
    pub fn iter(&self) -> impl Iterator<Item = &DataElement> {
        self.entries.values()
    }

    /// Iterate over the tags in ascending order.
    pub fn tags(&self) -> impl Iterator<Item = Tag> + '_ {
        self.entries.keys().copied()
    }

    /// The number of elements in the data set.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the data set holds no elements.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> IntoIterator for &'a DataSet {
    type Item = &'a DataElement;
    type IntoIter = btree_map::Values<'a, Tag, DataElement>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.values()
    }
}

impl IntoIterator for DataSet {
    type Item = DataElement;
    type IntoIter = IntoIter;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter {
            inner: self.entries.into_iter(),
        }
    }
}

/// Owning iterator over the elements of a data set,
/// in ascending tag order.
#[derive(Debug)]
pub struct IntoIter {
    inner: btree_map::IntoIter<Tag, DataElement>,
}

impl Iterator for IntoIter {
    type Item = DataElement;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|x| x.1)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl Extend<DataElement> for DataSet {
    fn extend<I>(&mut self, iter: I)
    where
        I: IntoIterator<Item = DataElement>,
    {
        self.entries.extend(iter.into_iter().map(|e| (e.tag(), e)))
    }
}

impl FromIterator<DataElement> for DataSet {
    fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = DataElement>,
    {
        DataSet {
            entries: iter.into_iter().map(|e| (e.tag(), e)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::VR;

    fn us(tag: Tag, v: u16) -> DataElement {
        DataElement::new(tag, VR::US, vec![v])
    }

    #[test]
    fn iteration_ascends_regardless_of_insertion_order() {
        let mut ds = DataSet::new();
        ds.put(us(Tag(0x0028, 0x0011), 512));
        ds.put(us(Tag(0x0008, 0x0008), 1));
        ds.put(us(Tag(0x7FE0, 0x0010), 0));
        ds.put(us(Tag(0x0028, 0x0010), 512));

        let tags: Vec<Tag> = ds.tags().collect();
        assert_eq!(
            tags,
            vec![
                Tag(0x0008, 0x0008),
                Tag(0x0028, 0x0010),
                Tag(0x0028, 0x0011),
                Tag(0x7FE0, 0x0010),
            ]
        );
        // a fresh iteration starts over from the smallest tag
        assert_eq!(ds.tags().next(), Some(Tag(0x0008, 0x0008)));
    }

    #[test]
    fn put_replaces_by_tag() {
        let mut ds = DataSet::new();
        assert!(ds.put(us(Tag(0x0028, 0x0010), 256)).is_none());
        let old = ds.put(us(Tag(0x0028, 0x0010), 512)).unwrap();
        assert_eq!(old.to_int::<u16>().unwrap(), 256);
        assert_eq!(ds.len(), 1);
        assert_eq!(
            ds.element(Tag(0x0028, 0x0010))
                .unwrap()
                .to_int::<u16>()
                .unwrap(),
            512
        );
    }

    #[test]
    fn lookup_misses_are_explicit() {
        let ds = DataSet::new();
        let tag = Tag(0x0010, 0x0010);
        assert!(!ds.contains(tag));
        let err = ds.element(tag).unwrap_err();
        assert_eq!(err.tag, tag);
    }

    #[test]
    fn remove_and_take() {
        let mut ds = DataSet::new();
        ds.put(us(Tag(0x0028, 0x0010), 64));
        assert!(ds.remove(Tag(0x0028, 0x0010)));
        assert!(!ds.remove(Tag(0x0028, 0x0010)));
        assert!(ds.take(Tag(0x0028, 0x0010)).is_err());
    }
}
