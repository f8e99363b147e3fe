use libsane_sys::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Parameters {
    pub format: FrameFormat,
    pub last_frame: bool,
    pub bytes_per_line: usize,
    pub pixels_per_line: usize,
    /// `None` when the device does not know the page length in advance,
    /// e.g. hand-held scanners and some sheet-fed ones.
    pub lines: Option<usize>,
    pub depth: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameFormat {
    Gray,
    RGB,
    Red,
    Green,
    Blue,
    Unknown(SANE_Frame),
}

impl Parameters {
    pub fn channels(&self) -> usize {
        match self.format {
            FrameFormat::RGB => 3,
            _ => 1,
        }
    }

    /// Size of the whole frame in bytes, if the line count is known.
    pub fn expected_bytes(&self) -> Option<usize> {
        self.lines.map(|lines| lines * self.bytes_per_line)
    }
}

impl From<SANE_Frame> for FrameFormat {
    fn from(value: SANE_Frame) -> Self {
        match value {
            SANE_Frame_SANE_FRAME_GRAY => Self::Gray,
            SANE_Frame_SANE_FRAME_RGB => Self::RGB,
            SANE_Frame_SANE_FRAME_RED => Self::Red,
            SANE_Frame_SANE_FRAME_GREEN => Self::Green,
            SANE_Frame_SANE_FRAME_BLUE => Self::Blue,
            value => Self::Unknown(value),
        }
    }
}
