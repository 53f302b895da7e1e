//! PDF dictionary implementation
//!
//! Keys are unique and insertion order is preserved, so the emitted file is
//! stable between runs and readable when inspected by hand.

use super::{Object, ObjectId};

/// PDF dictionary object
#[derive(Debug, Clone, Default)]
pub struct Dictionary {
    entries: Vec<(String, Object)>,
}

impl Dictionary {
    /// Create new dictionary
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Get value by key
    pub fn get(&self, key: &str) -> Option<&Object> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Get name value
    pub fn get_name(&self, key: &str) -> Option<&str> {
        match self.get(key) {
            Some(Object::Name(n)) => Some(n),
            _ => None,
        }
    }

    /// Get numeric value
    pub fn get_number(&self, key: &str) -> Option<f64> {
        match self.get(key) {
            Some(Object::Number(n)) => Some(*n),
            _ => None,
        }
    }

    /// Get nested dictionary value
    pub fn get_dict(&self, key: &str) -> Option<&Dictionary> {
        match self.get(key) {
            Some(Object::Dictionary(d)) => Some(d),
            _ => None,
        }
    }

    /// Check if key is present
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Set value, replacing any existing entry for the key
    pub fn set(&mut self, key: impl Into<String>, value: Object) {
        let key = key.into();
        if let Some(entry) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            entry.1 = value;
        } else {
            self.entries.push((key, value));
        }
    }

    /// Set name value
    pub fn set_name(&mut self, key: impl Into<String>, name: impl Into<String>) {
        self.set(key, Object::Name(name.into()));
    }

    /// Set reference value
    pub fn set_reference(&mut self, key: impl Into<String>, id: ObjectId) {
        self.set(key, Object::Reference(id));
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if dictionary is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Object)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Write dictionary to output
    pub fn write_to(&self, output: &mut Vec<u8>) {
        output.extend_from_slice(b"<<");
        for (key, value) in &self.entries {
            output.extend_from_slice(b"\n");
            Object::write_name(key, output);
            output.extend_from_slice(b" ");
            value.write_to(output);
        }
        output.extend_from_slice(b"\n>>");
    }
}

impl FromIterator<(String, Object)> for Dictionary {
    fn from_iter<I: IntoIterator<Item = (String, Object)>>(iter: I) -> Self {
        let mut dict = Dictionary::new();
        for (k, v) in iter {
            dict.set(k, v);
        }
        dict
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insertion_order_preserved() {
        let mut dict = Dictionary::new();
        dict.set_name("Type", "Page");
        dict.set("MediaBox", Object::Number(0.0));
        dict.set_name("Zebra", "Z");
        dict.set_name("Alpha", "A");

        let keys: Vec<&str> = dict.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["Type", "MediaBox", "Zebra", "Alpha"]);
    }

    #[test]
    fn test_set_replaces_in_place() {
        let mut dict = Dictionary::new();
        dict.set("Length", Object::Number(10.0));
        dict.set_name("Filter", "FlateDecode");
        dict.set("Length", Object::Number(99.0));

        assert_eq!(dict.len(), 2);
        assert_eq!(dict.get_number("Length"), Some(99.0));
        let keys: Vec<&str> = dict.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["Length", "Filter"]);
    }

    #[test]
    fn test_serialization() {
        let mut dict = Dictionary::new();
        dict.set_name("Type", "Catalog");
        dict.set_reference("Pages", ObjectId::new(1));

        let mut out = Vec::new();
        dict.write_to(&mut out);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "<<\n/Type /Catalog\n/Pages 1 0 R\n>>"
        );
    }
}
