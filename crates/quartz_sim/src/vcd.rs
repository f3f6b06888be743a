//! Value Change Dump output for simulation probes.
//!
//! [`VcdWriter`] produces IEEE 1364 VCD text from a sequence of sampled
//! probe values: a header, one `$var` per probe, and per-timestamp deltas
//! for the probes that changed. The output loads in GTKWave, Surfer, and
//! other waveform viewers.

use crate::error::SimError;
use quartz_bits::BitString;
use std::io::Write;

/// Handle of a registered probe.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProbeId(usize);

/// Streams probe samples as VCD text.
pub struct VcdWriter<W: Write> {
    writer: W,
    scope: String,
    probes: Vec<(String, String, usize)>,
    last: Vec<Option<BitString>>,
    header_written: bool,
    current_time: Option<u64>,
}

impl<W: Write> VcdWriter<W> {
    /// Creates a writer that will emit one scope with the given name.
    pub fn new(writer: W, scope: impl Into<String>) -> Self {
        Self {
            writer,
            scope: scope.into(),
            probes: Vec::new(),
            last: Vec::new(),
            header_written: false,
            current_time: None,
        }
    }

    /// Registers a probe before the first sample.
    ///
    /// # Panics
    ///
    /// Panics if called after sampling has started.
    pub fn probe(&mut self, name: impl Into<String>, width: usize) -> ProbeId {
        assert!(
            !self.header_written,
            "probes must be registered before the first sample"
        );
        let id = ProbeId(self.probes.len());
        let code = Self::make_id_code(self.probes.len());
        self.probes.push((name.into(), code, width));
        self.last.push(None);
        id
    }

    /// Generates a VCD identifier code from a sequential index, using
    /// printable ASCII starting at `!`.
    fn make_id_code(index: usize) -> String {
        let mut result = String::new();
        let mut index = index;
        loop {
            result.push((b'!' + (index % 94) as u8) as char);
            index /= 94;
            if index == 0 {
                break;
            }
            index -= 1;
        }
        result
    }

    fn write_header(&mut self) -> Result<(), SimError> {
        writeln!(self.writer, "$version")?;
        writeln!(self.writer, "  Quartz simulator")?;
        writeln!(self.writer, "$end")?;
        writeln!(self.writer, "$timescale")?;
        writeln!(self.writer, "  1ns")?;
        writeln!(self.writer, "$end")?;
        writeln!(self.writer, "$scope module {} $end", self.scope)?;
        for (name, code, width) in &self.probes {
            writeln!(self.writer, "$var wire {width} {code} {name} $end")?;
        }
        writeln!(self.writer, "$upscope $end")?;
        writeln!(self.writer, "$enddefinitions $end")?;
        writeln!(self.writer, "$dumpvars")?;
        self.header_written = true;
        Ok(())
    }

    fn format_value(value: &BitString) -> String {
        if value.width() == 1 {
            if value.at(0) { "1".into() } else { "0".into() }
        } else {
            let mut text = String::with_capacity(value.width() + 1);
            text.push('b');
            for bit in (0..value.width()).rev() {
                text.push(if value.at(bit) { '1' } else { '0' });
            }
            text
        }
    }

    /// Records one sample of every probe at the given timestamp. Only
    /// probes whose value changed since the previous sample are written.
    ///
    /// # Panics
    ///
    /// Panics if the number of values differs from the probe count.
    pub fn sample(&mut self, time: u64, values: &[BitString]) -> Result<(), SimError> {
        assert_eq!(
            values.len(),
            self.probes.len(),
            "expected one value per probe"
        );
        if !self.header_written {
            self.write_header()?;
        }
        let mut time_emitted = false;
        for (index, value) in values.iter().enumerate() {
            if self.last[index].as_ref() == Some(value) {
                continue;
            }
            if !time_emitted && self.current_time != Some(time) {
                writeln!(self.writer, "#{time}")?;
                self.current_time = Some(time);
            }
            time_emitted = true;
            let (_, code, width) = &self.probes[index];
            let text = Self::format_value(value);
            if *width == 1 {
                writeln!(self.writer, "{text}{code}")?;
            } else {
                writeln!(self.writer, "{text} {code}")?;
            }
            self.last[index] = Some(value.clone());
        }
        Ok(())
    }

    /// Flushes the output.
    pub fn finish(&mut self) -> Result<(), SimError> {
        if !self.header_written {
            self.write_header()?;
        }
        self.writer.flush()?;
        Ok(())
    }

    /// Consumes the writer, returning the underlying sink.
    pub fn into_inner(self) -> W {
        self.writer
    }
}
