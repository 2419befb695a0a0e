use crate::domain::models::StreamChunk;

#[derive(Debug, Default)]
pub struct StreamBuffer {
    text: String,
}

impl StreamBuffer {
    /// Appends the chunk and returns whether it completed the response.
    pub fn append(&mut self, chunk: &StreamChunk) -> bool {
        self.text.push_str(&chunk.text);
        return chunk.is_last;
    }

    /// Hands out the accumulated text and leaves the buffer empty.
    pub fn take(&mut self) -> String {
        return std::mem::take(&mut self.text);
    }

    pub fn clear(&mut self) {
        self.text.clear();
    }

    pub fn is_empty(&self) -> bool {
        return self.text.is_empty();
    }

    pub fn as_str(&self) -> &str {
        return &self.text;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(text: &str, is_last: bool) -> StreamChunk {
        return StreamChunk {
            text: text.to_string(),
            is_last,
        };
    }

    #[test]
    fn it_concatenates_until_the_last_chunk() {
        let mut buffer = StreamBuffer::default();
        assert!(!buffer.append(&chunk("Hel", false)));
        assert!(!buffer.append(&chunk("lo", false)));
        assert_eq!(buffer.as_str(), "Hello");

        assert!(buffer.append(&chunk("!", true)));
        assert_eq!(buffer.take(), "Hello!");
        assert!(buffer.is_empty());
    }

    #[test]
    fn it_accepts_an_empty_closing_chunk() {
        let mut buffer = StreamBuffer::default();
        buffer.append(&chunk("done", false));
        assert!(buffer.append(&chunk("", true)));
        assert_eq!(buffer.take(), "done");
    }
}
