use log::trace;

use super::bit_reader::BitReader;
use super::dictionary::{Dictionary, MAX_CODE_WIDTH};
use crate::error::DecodeError;
use crate::source::ByteSource;

const MIN_CODE_SIZE: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    AwaitFirst,
    Decoding { prev_code: u16 },
    Cleared,
    Ended,
}

pub(crate) struct LzwDecoder<'a, S: ByteSource> {
    bits: BitReader<'a, S>,
    dictionary: Dictionary,
    min_code_size: u8,
    clear_code: u16,
    end_code: u16,
    state: State,

    // expansion of the most recent code, handed out from `cursor`
    phrase: Vec<u8>,
    cursor: usize,
}

impl<'a, S: ByteSource> LzwDecoder<'a, S> {
    pub(crate) fn new(source: &'a mut S, min_code_size: u8) -> Result<Self, DecodeError> {
        if !(MIN_CODE_SIZE..MAX_CODE_WIDTH).contains(&min_code_size) {
            return Err(DecodeError::InvalidCodeSize(min_code_size));
        }

        let clear_code = 1 << min_code_size;
        trace!("lzw: min_code_size={min_code_size} clear_code={clear_code}");

        Ok(Self {
            bits: BitReader::new(source),
            dictionary: Dictionary::new(min_code_size),
            min_code_size,
            clear_code,
            end_code: clear_code + 1,
            state: State::AwaitFirst,
            phrase: Vec::with_capacity(super::dictionary::MAX_CODES),
            cursor: 0,
        })
    }

    pub(crate) fn next_index(&mut self) -> Result<Option<u8>, DecodeError> {
        while self.cursor == self.phrase.len() {
            if self.state == State::Ended {
                return Ok(None);
            }

            self.phrase.clear();
            self.cursor = 0;
            if let Err(err) = self.decode_code() {
                self.state = State::Ended;
                return Err(err);
            }
        }

        let index = self.phrase[self.cursor];
        self.cursor += 1;
        Ok(Some(index))
    }

    fn decode_code(&mut self) -> Result<(), DecodeError> {
        loop {
            let code = self.bits.read_code(self.dictionary.code_width())?;

            if code == self.clear_code {
                trace!("lzw: clear code at next_code={}", self.dictionary.next_code());
                self.dictionary.reset(self.min_code_size);
                self.state = State::Cleared;
                continue;
            }

            if code == self.end_code {
                trace!("lzw: end code");
                self.state = State::Ended;
                return Ok(());
            }

            let prev_code = match self.state {
                State::Decoding { prev_code } => prev_code,
                // first code of a run is output as is, nothing to append to yet
                _ => {
                    self.dictionary.expand(code, &mut self.phrase)?;
                    self.state = State::Decoding { prev_code: code };
                    return Ok(());
                }
            };

            if self.dictionary.contains(code) {
                self.dictionary.expand(code, &mut self.phrase)?;
                if !self.dictionary.is_full() {
                    let first = self.dictionary.first_byte(code)?;
                    self.dictionary.append(prev_code, first);
                }
                self.state = State::Decoding { prev_code: code };
            } else if code == self.dictionary.next_code() {
                // KwKwK: the encoder used the entry it was in the middle of creating
                let first = self.dictionary.first_byte(prev_code)?;
                self.dictionary.expand(prev_code, &mut self.phrase)?;
                self.phrase.push(first);
                self.dictionary.append(prev_code, first);
                self.state = State::Decoding {
                    prev_code: self.dictionary.next_code() - 1,
                };
            } else {
                return Err(DecodeError::CorruptDictionary {
                    code,
                    next_code: self.dictionary.next_code(),
                });
            }

            return Ok(());
        }
    }

    pub(crate) fn finish(self) -> Result<usize, DecodeError> {
        self.bits.finish()
    }
}

impl<S: ByteSource> Iterator for LzwDecoder<'_, S> {
    type Item = Result<u8, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_index().transpose()
    }
}
