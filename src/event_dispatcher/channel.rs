use std::io::{self, Write};

use serde::Deserialize;

/// Where encoded messages go.
pub trait Deliver {
    /// Writes one message and flushes the destination.
    fn deliver(&mut self, body: &[u8]) -> io::Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// Text on a terminal, framed otherwise
    #[default]
    Auto,
    /// One message per line
    Text,
    /// 4-byte little-endian length prefix, then the message
    Framed,
}

impl OutputMode {
    /// Turns `Auto` into a concrete mode.
    pub fn resolve(self, stdout_is_terminal: bool) -> OutputMode {
        match self {
            OutputMode::Auto if stdout_is_terminal => OutputMode::Text,
            OutputMode::Auto => OutputMode::Framed,
            mode => mode,
        }
    }
}

/// Newline-terminated messages.
#[derive(Debug)]
pub struct TextChannel<W> {
    writer: W,
}

impl<W: Write> TextChannel<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> Deliver for TextChannel<W> {
    fn deliver(&mut self, body: &[u8]) -> io::Result<()> {
        self.writer.write_all(body)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()
    }
}

/// `[u32 LE length][body]`, the envelope browser native messaging expects.
#[derive(Debug)]
pub struct FramedChannel<W> {
    writer: W,
}

impl<W: Write> FramedChannel<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> Deliver for FramedChannel<W> {
    fn deliver(&mut self, body: &[u8]) -> io::Result<()> {
        let len = u32::try_from(body.len()).map_err(|_| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("message of {} bytes does not fit a u32 prefix", body.len()),
            )
        })?;
        self.writer.write_all(&len.to_le_bytes())?;
        self.writer.write_all(body)?;
        self.writer.flush()
    }
}

/// A concrete channel picked at startup from an [`OutputMode`].
#[derive(Debug)]
pub enum OutputChannel<W> {
    Text(TextChannel<W>),
    Framed(FramedChannel<W>),
}

impl<W: Write> OutputChannel<W> {
    /// `Auto` must already be resolved; it falls back to framed here.
    pub fn new(mode: OutputMode, writer: W) -> Self {
        match mode {
            OutputMode::Text => OutputChannel::Text(TextChannel::new(writer)),
            OutputMode::Framed | OutputMode::Auto => {
                OutputChannel::Framed(FramedChannel::new(writer))
            }
        }
    }
}

impl<W: Write> Deliver for OutputChannel<W> {
    fn deliver(&mut self, body: &[u8]) -> io::Result<()> {
        match self {
            OutputChannel::Text(channel) => channel.deliver(body),
            OutputChannel::Framed(channel) => channel.deliver(body),
        }
    }
}

impl<D: Deliver + ?Sized> Deliver for &mut D {
    fn deliver(&mut self, body: &[u8]) -> io::Result<()> {
        (**self).deliver(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Reads back a stream of framed messages.
    fn read_framed(mut bytes: &[u8]) -> Vec<Vec<u8>> {
        let mut messages = Vec::new();
        while !bytes.is_empty() {
            let (prefix, rest) = bytes.split_at(4);
            let len = u32::from_le_bytes(prefix.try_into().unwrap()) as usize;
            let (body, rest) = rest.split_at(len);
            messages.push(body.to_vec());
            bytes = rest;
        }
        messages
    }

    #[test]
    fn framed_prefix_is_exact_little_endian_length() {
        let mut channel = FramedChannel::new(Vec::new());
        let body = br#"{"status":"ok","note":"stream frame"}"#;
        channel.deliver(body).unwrap();

        let out = channel.into_inner();
        assert_eq!(&out[..4], &(body.len() as u32).to_le_bytes());
        assert_eq!(&out[..4], &[37, 0, 0, 0]);
        assert_eq!(&out[4..], body);
    }

    #[test]
    fn framed_stream_round_trips() {
        let bodies: [&[u8]; 3] = [b"{}", b"", "{\"k\":\"\u{00e9}\"}".as_bytes()];
        let mut channel = FramedChannel::new(Vec::new());
        for body in bodies {
            channel.deliver(body).unwrap();
        }
        let decoded = read_framed(&channel.into_inner());
        assert_eq!(decoded, bodies.map(|b| b.to_vec()));
    }

    #[test]
    fn framed_multibyte_length_prefix() {
        let body = vec![b'a'; 0x0102];
        let mut channel = FramedChannel::new(Vec::new());
        channel.deliver(&body).unwrap();
        assert_eq!(&channel.into_inner()[..4], &[0x02, 0x01, 0, 0]);
    }

    #[test]
    fn text_mode_is_newline_terminated() {
        let mut channel = TextChannel::new(Vec::new());
        channel.deliver(b"{\"frame\":1}").unwrap();
        channel.deliver(b"{\"frame\":2}").unwrap();
        assert_eq!(channel.into_inner(), b"{\"frame\":1}\n{\"frame\":2}\n");
    }

    #[test]
    fn auto_mode_follows_the_terminal() {
        assert_eq!(OutputMode::Auto.resolve(true), OutputMode::Text);
        assert_eq!(OutputMode::Auto.resolve(false), OutputMode::Framed);
        assert_eq!(OutputMode::Text.resolve(false), OutputMode::Text);
        assert_eq!(OutputMode::Framed.resolve(true), OutputMode::Framed);
    }

    #[test]
    fn output_channel_dispatches_by_mode() {
        let mut text = OutputChannel::new(OutputMode::Text, Vec::new());
        text.deliver(b"x").unwrap();
        let OutputChannel::Text(text) = text else {
            panic!("expected text channel");
        };
        assert_eq!(text.into_inner(), b"x\n");

        let framed = OutputChannel::new(OutputMode::Framed, Vec::<u8>::new());
        assert!(matches!(framed, OutputChannel::Framed(_)));
    }
}
