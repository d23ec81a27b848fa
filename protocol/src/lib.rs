#![no_std]

use core::fmt;

/// Length of a command frame on the wire.
pub const FRAME_LEN: usize = 3;

/// Payload the hub writes to stdout whenever it can accept the next frame.
pub const READY: &[u8; FRAME_LEN] = b"rdy";

/// Pybricks "write stdin" command, prepended to every outgoing frame.
pub const WRITE_STDIN: u8 = 0x06;

/// Pybricks "write stdout" event, first byte of hub output notifications.
pub const WRITE_STDOUT: u8 = 0x01;

#[derive(thiserror_no_std::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    #[error("command {0:?} has no wire representation")]
    InvalidArgument(Command),

    #[error("frame must be 3 bytes, got {0}")]
    FrameLength(usize),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    Forward,
    Reverse,
    Stop,
    PivotRightForward,
    PivotLeftForward,
    PivotRightReverse,
    PivotLeftReverse,
    Shutdown,
    Unknown,
}

impl Command {
    /// Every command that can be put on the wire.
    pub const KNOWN: [Command; 8] = [
        Command::Forward,
        Command::Reverse,
        Command::Stop,
        Command::PivotRightForward,
        Command::PivotLeftForward,
        Command::PivotRightReverse,
        Command::PivotLeftReverse,
        Command::Shutdown,
    ];

    pub fn tag(self) -> Option<&'static [u8; FRAME_LEN]> {
        match self {
            Command::Forward => Some(b"fwd"),
            Command::Reverse => Some(b"rev"),
            Command::Stop => Some(b"stp"),
            Command::PivotRightForward => Some(b"rfw"),
            Command::PivotLeftForward => Some(b"lfw"),
            Command::PivotRightReverse => Some(b"rre"),
            Command::PivotLeftReverse => Some(b"lre"),
            Command::Shutdown => Some(b"bye"),
            Command::Unknown => None,
        }
    }

    /// Decodes received bytes. Never fails: anything that is not exactly one
    /// known tag is `Unknown`.
    pub fn decode(data: &[u8]) -> Command {
        Command::KNOWN
            .into_iter()
            .find(|cmd| cmd.tag().is_some_and(|tag| &tag[..] == data))
            .unwrap_or(Command::Unknown)
    }

    pub fn encode(self) -> Result<Frame, Error> {
        match self.tag() {
            Some(tag) => Ok(Frame(*tag)),
            None => Err(Error::InvalidArgument(self)),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.tag() {
            // tags are ASCII
            Some(tag) => tag.iter().try_for_each(|b| write!(f, "{}", *b as char)),
            None => f.write_str("???"),
        }
    }
}

/// A single command on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Frame([u8; FRAME_LEN]);

impl Frame {
    pub fn as_bytes(&self) -> &[u8; FRAME_LEN] {
        &self.0
    }

    pub fn command(&self) -> Command {
        Command::decode(&self.0)
    }

    /// Wraps the frame into a Pybricks stdin write.
    pub fn to_stdin(&self) -> [u8; FRAME_LEN + 1] {
        [WRITE_STDIN, self.0[0], self.0[1], self.0[2]]
    }
}

impl TryFrom<&[u8]> for Frame {
    type Error = Error;

    fn try_from(data: &[u8]) -> Result<Self, Self::Error> {
        let bytes: [u8; FRAME_LEN] = data.try_into().map_err(|_| Error::FrameLength(data.len()))?;
        Ok(Frame(bytes))
    }
}

/// Notification received from the hub.
#[derive(Debug, PartialEq, Eq)]
pub enum Notification<'a> {
    /// The hub waits for the next frame.
    Ready,
    /// Anything else the hub program printed.
    Stdout(&'a [u8]),
    /// Events other than stdout, e.g. hub status reports.
    Other(&'a [u8]),
}

impl<'a> Notification<'a> {
    pub fn parse(data: &'a [u8]) -> Self {
        match data.split_first() {
            Some((&WRITE_STDOUT, payload)) if payload == READY => Notification::Ready,
            Some((&WRITE_STDOUT, payload)) => Notification::Stdout(payload),
            _ => Notification::Other(data),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_table() {
        assert_eq!(Command::decode(b"fwd"), Command::Forward);
        assert_eq!(Command::decode(b"rev"), Command::Reverse);
        assert_eq!(Command::decode(b"stp"), Command::Stop);
        assert_eq!(Command::decode(b"rfw"), Command::PivotRightForward);
        assert_eq!(Command::decode(b"lfw"), Command::PivotLeftForward);
        assert_eq!(Command::decode(b"rre"), Command::PivotRightReverse);
        assert_eq!(Command::decode(b"lre"), Command::PivotLeftReverse);
        assert_eq!(Command::decode(b"bye"), Command::Shutdown);
    }

    #[test]
    fn test_decode_unknown() {
        assert_eq!(Command::decode(b"xyz"), Command::Unknown);
        assert_eq!(Command::decode(b"FWD"), Command::Unknown);
        assert_eq!(Command::decode(&[0xff, 0xfe, 0x00]), Command::Unknown);
        // malformed lengths
        assert_eq!(Command::decode(b"fw"), Command::Unknown);
        assert_eq!(Command::decode(b""), Command::Unknown);
        assert_eq!(Command::decode(b"fwdx"), Command::Unknown);
    }

    #[test]
    fn test_encode_decode() {
        for cmd in Command::KNOWN {
            let frame = cmd.encode().unwrap();
            assert_eq!(Command::decode(frame.as_bytes()), cmd);
            assert_eq!(frame.command(), cmd);
        }
    }

    #[test]
    fn test_encode_unknown() {
        assert_eq!(
            Command::Unknown.encode(),
            Err(Error::InvalidArgument(Command::Unknown))
        );
    }

    #[test]
    fn test_frame_length() {
        assert_eq!(Frame::try_from(&b"ab"[..]), Err(Error::FrameLength(2)));
        assert_eq!(Frame::try_from(&b"abcd"[..]), Err(Error::FrameLength(4)));
        let frame = Frame::try_from(&b"lre"[..]).unwrap();
        assert_eq!(frame.command(), Command::PivotLeftReverse);
    }

    #[test]
    fn test_stdin_envelope() {
        let frame = Command::Forward.encode().unwrap();
        assert_eq!(frame.to_stdin(), [0x06, b'f', b'w', b'd']);
    }

    #[test]
    fn test_notification() {
        assert_eq!(Notification::parse(b"\x01rdy"), Notification::Ready);
        assert_eq!(
            Notification::parse(b"\x01hello"),
            Notification::Stdout(b"hello")
        );
        // ready marker without the stdout tag is not a ready signal
        assert_eq!(Notification::parse(b"rdy"), Notification::Other(b"rdy"));
        assert_eq!(
            Notification::parse(b"\x00\x01\x02"),
            Notification::Other(b"\x00\x01\x02")
        );
        assert_eq!(Notification::parse(b""), Notification::Other(b""));
        assert_eq!(Notification::parse(b"\x01"), Notification::Stdout(b""));
    }
}
