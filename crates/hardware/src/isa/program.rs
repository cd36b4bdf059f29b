//! Program images loaded into an execution context.

/// Text segment plus initial data words.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    /// Address of the first instruction; execution starts here.
    pub text_base: u32,
    /// Instruction words.
    pub text: Vec<u32>,
    /// Initial memory contents as `(address, word)` pairs.
    pub data: Vec<(u32, u32)>,
}

impl Program {
    /// Creates a program with no initial data.
    pub const fn new(text_base: u32, text: Vec<u32>) -> Self {
        Self {
            text_base,
            text,
            data: Vec::new(),
        }
    }

    /// Adds an initial data word.
    #[must_use]
    pub fn with_data(mut self, addr: u32, value: u32) -> Self {
        self.data.push((addr, value));
        self
    }

    /// First address past the text segment.
    pub fn text_end(&self) -> u32 {
        self.text_base + (self.text.len() as u32) * crate::common::constants::INSTRUCTION_SIZE
    }

    /// Returns true if `pc` addresses an instruction of this program.
    pub fn contains(&self, pc: u32) -> bool {
        pc >= self.text_base && pc < self.text_end() && pc % 4 == 0
    }
}
