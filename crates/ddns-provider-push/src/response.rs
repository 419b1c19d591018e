// # Reply Decoding
//
// namecheap-style update endpoints answer with a small XML document:
//
// ```xml
// <?xml version="1.0"?>
// <interface-response>
//   <Command>SETDNSHOST</Command>
//   <Language>eng</Language>
//   <IP>87.186.224.7</IP>
//   <ErrCount>0</ErrCount>
//   <ResponseCount>0</ResponseCount>
//   <Done>true</Done>
//   <debug><![CDATA[]]></debug>
// </interface-response>
// ```
//
// Only `ErrCount` and `Done`, as direct children of the root element, are
// read. Either may be missing.

use ddns_core::{Error, Result};
use quick_xml::Reader;
use quick_xml::events::Event;

/// Fields read from a provider reply
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderReply {
    /// Trimmed text of the root's `ErrCount` child
    pub err_count: Option<String>,
    /// Trimmed text of the root's `Done` child
    pub done: Option<String>,
}

#[derive(Debug, Clone, Copy)]
enum Field {
    ErrCount,
    Done,
}

impl Field {
    fn from_name(name: &[u8]) -> Option<Self> {
        match name {
            b"ErrCount" => Some(Self::ErrCount),
            b"Done" => Some(Self::Done),
            _ => None,
        }
    }
}

impl ProviderReply {
    /// Decode a reply body
    ///
    /// Fails with [`Error::ResponseDecode`] when the body is not a single
    /// well-formed XML document.
    pub fn decode(body: &str) -> Result<Self> {
        let mut reader = Reader::from_str(body);
        let mut reply = Self::default();

        let mut depth = 0usize;
        let mut roots = 0usize;
        // Field currently open at depth 2, with its text so far
        let mut open: Option<(Field, String)> = None;

        loop {
            let event = reader.read_event().map_err(|e| {
                Error::response_decode(format!(
                    "malformed XML at position {}: {}",
                    reader.error_position(),
                    e
                ))
            })?;

            match event {
                Event::Start(start) => {
                    if depth == 0 {
                        roots += 1;
                        if roots > 1 {
                            return Err(Error::response_decode("multiple root elements"));
                        }
                    } else if depth == 1 {
                        open = Field::from_name(start.name().as_ref())
                            .map(|field| (field, String::new()));
                    }
                    depth += 1;
                }
                Event::Empty(empty) => {
                    if depth == 0 {
                        roots += 1;
                        if roots > 1 {
                            return Err(Error::response_decode("multiple root elements"));
                        }
                    } else if depth == 1
                        && let Some(field) = Field::from_name(empty.name().as_ref())
                    {
                        reply.set(field, String::new());
                    }
                }
                Event::End(_) => {
                    depth = depth
                        .checked_sub(1)
                        .ok_or_else(|| Error::response_decode("unexpected closing tag"))?;
                    if depth == 1
                        && let Some((field, text)) = open.take()
                    {
                        reply.set(field, text.trim().to_string());
                    }
                }
                Event::Text(text) => {
                    let text = text.unescape().map_err(|e| {
                        Error::response_decode(format!("invalid character data: {}", e))
                    })?;
                    if depth == 0 {
                        if !text.trim().is_empty() {
                            return Err(Error::response_decode("text outside the root element"));
                        }
                    } else if depth == 2
                        && let Some((_, buffer)) = open.as_mut()
                    {
                        buffer.push_str(&text);
                    }
                }
                Event::CData(data) => {
                    if depth == 0 {
                        return Err(Error::response_decode("CDATA outside the root element"));
                    }
                    if depth == 2
                        && let Some((_, buffer)) = open.as_mut()
                    {
                        buffer.push_str(&String::from_utf8_lossy(&data));
                    }
                }
                Event::Eof => break,
                // Declaration, comments, processing instructions, doctype
                _ => {}
            }
        }

        if roots == 0 {
            return Err(Error::response_decode("no root element"));
        }
        if depth != 0 {
            return Err(Error::response_decode("unclosed element at end of document"));
        }

        Ok(reply)
    }

    /// First occurrence wins
    fn set(&mut self, field: Field, value: String) {
        let slot = match field {
            Field::ErrCount => &mut self.err_count,
            Field::Done => &mut self.done,
        };
        if slot.is_none() {
            *slot = Some(value);
        }
    }
}
