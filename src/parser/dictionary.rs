use crate::error::DecodeError;

pub(crate) const MAX_CODES: usize = 4096;
pub(crate) const MAX_CODE_WIDTH: u8 = 12;

const NO_PREFIX: u16 = u16::MAX;

/// LZW string table. Every phrase is stored as a back pointer to its prefix code plus the
/// byte appended to it, so the table is a fixed 4096 slots no matter how long phrases get.
pub(crate) struct Dictionary {
    prefix: Box<[u16]>,
    suffix: Box<[u8]>,
    // first byte of each phrase, cached so lookups never walk the chain
    first: Box<[u8]>,

    clear_code: u16,
    next_code: u16,
    code_width: u8,
}

impl Dictionary {
    pub(crate) fn new(min_code_size: u8) -> Self {
        let mut dictionary = Self {
            prefix: vec![NO_PREFIX; MAX_CODES].into_boxed_slice(),
            suffix: vec![0; MAX_CODES].into_boxed_slice(),
            first: vec![0; MAX_CODES].into_boxed_slice(),
            clear_code: 0,
            next_code: 0,
            code_width: 0,
        };
        dictionary.reset(min_code_size);
        dictionary
    }

    pub(crate) fn reset(&mut self, min_code_size: u8) {
        debug_assert!(min_code_size < MAX_CODE_WIDTH);

        self.clear_code = 1 << min_code_size;
        self.next_code = self.clear_code + 2;
        self.code_width = min_code_size + 1;

        for code in 0..self.clear_code {
            let literal = code as usize;
            self.prefix[literal] = NO_PREFIX;
            self.suffix[literal] = code as u8;
            self.first[literal] = code as u8;
        }
    }

    pub(crate) fn code_width(&self) -> u8 {
        self.code_width
    }

    pub(crate) fn next_code(&self) -> u16 {
        self.next_code
    }

    pub(crate) fn is_full(&self) -> bool {
        self.next_code as usize >= MAX_CODES
    }

    pub(crate) fn contains(&self, code: u16) -> bool {
        code < self.clear_code || (code > self.clear_code + 1 && code < self.next_code)
    }

    // false once the table is full, decoding carries on with it frozen
    pub(crate) fn append(&mut self, prefix: u16, byte: u8) -> bool {
        debug_assert!(self.contains(prefix));

        if self.is_full() {
            return false;
        }

        let entry = self.next_code as usize;
        self.prefix[entry] = prefix;
        self.suffix[entry] = byte;
        self.first[entry] = self.first[prefix as usize];
        self.next_code += 1;

        if self.next_code == 1 << self.code_width && self.code_width < MAX_CODE_WIDTH {
            self.code_width += 1;
        }

        true
    }

    pub(crate) fn first_byte(&self, code: u16) -> Result<u8, DecodeError> {
        if !self.contains(code) {
            return Err(self.unknown(code));
        }
        Ok(self.first[code as usize])
    }

    pub(crate) fn expand(&self, code: u16, out: &mut Vec<u8>) -> Result<(), DecodeError> {
        if !self.contains(code) {
            return Err(self.unknown(code));
        }

        let start = out.len();
        let mut current = code;
        for _ in 0..MAX_CODES {
            let slot = current as usize;
            out.push(self.suffix[slot]);

            match self.prefix[slot] {
                NO_PREFIX => {
                    out[start..].reverse();
                    return Ok(());
                }
                prefix => current = prefix,
            }
        }

        // a chain longer than the table can only come from a cycle
        out.truncate(start);
        Err(self.unknown(code))
    }

    fn unknown(&self, code: u16) -> DecodeError {
        DecodeError::CorruptDictionary {
            code,
            next_code: self.next_code,
        }
    }
}
