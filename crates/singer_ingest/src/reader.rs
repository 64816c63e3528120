use std::io::{BufRead, ErrorKind};

#[derive(Debug, Eq, PartialEq)]
pub enum BoundedLine {
    Line {
        line_number: usize,
        bytes: Vec<u8>,
    },
    LineTooLong {
        line_number: usize,
        observed_bytes: usize,
        max_line_bytes: usize,
    },
    IoError {
        line_number: usize,
    },
}

/// Splits a byte stream on `\n` without ever holding more than
/// `max_line_bytes` of a single line in memory.
///
/// An oversized line is drained and reported as [`BoundedLine::LineTooLong`];
/// iteration then resumes at the next line. A read error ends iteration.
pub struct BoundedLineReader<R: BufRead> {
    reader: R,
    max_line_bytes: usize,
    current_line: Vec<u8>,
    observed_bytes: usize,
    line_number: usize,
    done: bool,
}

impl<R: BufRead> BoundedLineReader<R> {
    pub fn new(reader: R, max_line_bytes: usize) -> Self {
        Self {
            reader,
            max_line_bytes,
            current_line: Vec::new(),
            observed_bytes: 0,
            line_number: 0,
            done: false,
        }
    }

    fn finish_line(&mut self) -> BoundedLine {
        self.line_number += 1;
        let line_number = self.line_number;
        let observed_bytes = std::mem::take(&mut self.observed_bytes);

        if observed_bytes > self.max_line_bytes {
            self.current_line.clear();
            return BoundedLine::LineTooLong {
                line_number,
                observed_bytes,
                max_line_bytes: self.max_line_bytes,
            };
        }
        BoundedLine::Line {
            line_number,
            bytes: std::mem::take(&mut self.current_line),
        }
    }
}

fn append_segment(
    current_line: &mut Vec<u8>,
    observed_bytes: &mut usize,
    max_line_bytes: usize,
    segment: &[u8],
) {
    *observed_bytes = observed_bytes.saturating_add(segment.len());
    if *observed_bytes > max_line_bytes {
        current_line.clear();
    } else {
        current_line.extend_from_slice(segment);
    }
}

impl<R: BufRead> Iterator for BoundedLineReader<R> {
    type Item = BoundedLine;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        loop {
            let available = match self.reader.fill_buf() {
                Ok(buf) => buf,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(_) => {
                    self.done = true;
                    self.line_number += 1;
                    return Some(BoundedLine::IoError {
                        line_number: self.line_number,
                    });
                }
            };

            if available.is_empty() {
                self.done = true;
                if self.observed_bytes > 0 {
                    return Some(self.finish_line());
                }
                return None;
            }

            let newline_idx = available.iter().position(|b| *b == b'\n');
            let segment = match newline_idx {
                Some(idx) => &available[..idx],
                None => available,
            };
            append_segment(
                &mut self.current_line,
                &mut self.observed_bytes,
                self.max_line_bytes,
                segment,
            );

            match newline_idx {
                Some(idx) => {
                    self.reader.consume(idx + 1);
                    return Some(self.finish_line());
                }
                None => {
                    let consumed = available.len();
                    self.reader.consume(consumed);
                }
            }
        }
    }
}
