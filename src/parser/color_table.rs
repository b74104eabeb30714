use crate::error::DecodeError;
use crate::source::ByteSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const TRANSPARENT: Rgba = Rgba::new(0, 0, 0, 0);
    pub const BLACK: Rgba = Rgba::opaque(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ColorTable {
    entries: Box<[Rgba]>,
}

impl ColorTable {
    pub(crate) fn len_for_exponent(exponent: u8) -> usize {
        1 << ((exponent & 0b111) + 1)
    }

    pub(crate) fn read<S: ByteSource>(source: &mut S, exponent: u8) -> Result<Self, DecodeError> {
        let len = Self::len_for_exponent(exponent);
        let raw = source.read_bytes(len * 3)?;

        let entries = raw
            .chunks_exact(3)
            .map(|rgb| Rgba::opaque(rgb[0], rgb[1], rgb[2]))
            .collect();

        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: u8) -> Option<Rgba> {
        self.entries.get(index as usize).copied()
    }

    pub fn entries(&self) -> &[Rgba] {
        &self.entries
    }

    pub(crate) fn reduce(&self, index: u8) -> u8 {
        match self.entries.len() {
            0 => index,
            len => (index as usize % len) as u8,
        }
    }

    pub(crate) fn resolve(&self, index: u8) -> Rgba {
        self.get(index).unwrap_or(Rgba::BLACK)
    }
}

impl FromIterator<Rgba> for ColorTable {
    fn from_iter<I: IntoIterator<Item = Rgba>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ColorTable, Rgba};
    use crate::error::DecodeError;
    use std::io::Cursor;

    #[test]
    fn reads_triplets_as_opaque() {
        let mut source = Cursor::new(vec![255, 0, 0, 0, 0, 255, 9]);
        let table = ColorTable::read(&mut source, 0).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.get(0), Some(Rgba::opaque(255, 0, 0)));
        assert_eq!(table.get(1), Some(Rgba::opaque(0, 0, 255)));
        assert_eq!(table.get(2), None);
    }

    #[test]
    fn size_follows_exponent() {
        assert_eq!(ColorTable::len_for_exponent(0), 2);
        assert_eq!(ColorTable::len_for_exponent(1), 4);
        assert_eq!(ColorTable::len_for_exponent(7), 256);
    }

    #[test]
    fn truncated_table() {
        let mut source = Cursor::new(vec![1, 2, 3, 4]);
        assert!(matches!(
            ColorTable::read(&mut source, 0),
            Err(DecodeError::TruncatedStream)
        ));
    }

    #[test]
    fn indices_wrap_and_missing_table_is_black() {
        let table: ColorTable = [Rgba::opaque(1, 1, 1), Rgba::opaque(2, 2, 2)]
            .into_iter()
            .collect();
        assert_eq!(table.reduce(5), 1);
        assert_eq!(table.resolve(table.reduce(4)), Rgba::opaque(1, 1, 1));

        let empty = ColorTable::default();
        assert_eq!(empty.reduce(200), 200);
        assert_eq!(empty.resolve(200), Rgba::BLACK);
    }
}
