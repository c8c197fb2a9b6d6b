use async_trait::async_trait;
use tokio::io::{
    self, AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt,
    BufReader, Stdin, Stdout,
};

use crate::responder::Responder;
use crate::{Error, Message, Role};

/// A responder that hands the turn to a human at the console.
///
/// When called with a prior message, that message is printed before the
/// prompt. The line read back becomes a user message verbatim, minus its
/// line terminator.
pub struct ConsoleResponder<R, W> {
    name: String,
    reader: R,
    writer: W,
}

impl ConsoleResponder<BufReader<Stdin>, Stdout> {
    /// Creates a console responder over the process's stdin and stdout.
    #[inline]
    pub fn stdio<N: Into<String>>(name: N) -> Self {
        Self::new(name, BufReader::new(io::stdin()), io::stdout())
    }
}

impl<R, W> ConsoleResponder<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    /// Creates a console responder over arbitrary streams.
    #[inline]
    pub fn new<N: Into<String>>(name: N, reader: R, writer: W) -> Self {
        Self {
            name: name.into(),
            reader,
            writer,
        }
    }

    /// Consumes the responder, returning the underlying streams.
    #[inline]
    pub fn into_inner(self) -> (R, W) {
        (self.reader, self.writer)
    }

    async fn render(&mut self, msg: &Message) -> io::Result<()> {
        let line = format!("{}: {}\n", msg.name(), msg.content());
        self.writer.write_all(line.as_bytes()).await
    }

    async fn prompt(&mut self) -> io::Result<()> {
        let prompt = format!("{}> ", self.name);
        self.writer.write_all(prompt.as_bytes()).await?;
        self.writer.flush().await
    }

    async fn read_line(&mut self) -> Result<String, Error> {
        let mut line = Vec::new();
        if self.reader.read_until(b'\n', &mut line).await? == 0 {
            return Err(Error::InputClosed);
        }
        if line.ends_with(b"\n") {
            line.pop();
            if line.ends_with(b"\r") {
                line.pop();
            }
        }
        // Input is never rejected, invalid bytes become U+FFFD.
        Ok(String::from_utf8_lossy(&line).into_owned())
    }
}

#[async_trait]
impl<R, W> Responder for ConsoleResponder<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    #[inline]
    fn name(&self) -> &str {
        &self.name
    }

    async fn respond(
        &mut self,
        incoming: Option<&Message>,
    ) -> Result<Message, Error> {
        if let Some(incoming) = incoming {
            self.render(incoming).await?;
        }
        self.prompt().await?;
        let line = self.read_line().await?;
        Ok(Message::new(&self.name, line, Role::User))
    }
}
