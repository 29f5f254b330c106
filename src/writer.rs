//! Track file output.
//!
//! Uses itoa for integer formatting and ryu for float formatting
//! to avoid allocation in the row loop.

use crate::color::Gradient;
use crate::commands::bed::BedRow;
use crate::commands::bedgraph::BedGraphRow;
use crate::error::{Result, TrackError};
use crate::record::{Dataset, IntervalRecord, Schema};
use crate::track::{TrackContainer, TrackData};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

/// Buffer size for TrackWriter (1MB default).
const DEFAULT_BUFFER_SIZE: usize = 1024 * 1024;

/// Output options.
#[derive(Debug, Clone, Copy)]
pub struct WriteOptions {
    /// Write a genome browser `track` line before the rows
    pub track_line: bool,
    /// Write the category label in the BED name column
    pub bed_label: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            track_line: true,
            bed_label: false,
        }
    }
}

/// Buffered track writer.
pub struct TrackWriter<W: Write> {
    writer: BufWriter<W>,
    options: WriteOptions,
    itoa_buf: itoa::Buffer,
    ryu_buf: ryu::Buffer,
}

impl<W: Write> TrackWriter<W> {
    pub fn new(output: W, options: WriteOptions) -> Self {
        Self::with_capacity(DEFAULT_BUFFER_SIZE, output, options)
    }

    pub fn with_capacity(capacity: usize, output: W, options: WriteOptions) -> Self {
        Self {
            writer: BufWriter::with_capacity(capacity, output),
            options,
            itoa_buf: itoa::Buffer::new(),
            ryu_buf: ryu::Buffer::new(),
        }
    }

    /// Write a whole container: optional track line, then every row.
    ///
    /// BedGraph windows are produced while writing.
    pub fn write_track(&mut self, container: TrackContainer) -> Result<()> {
        if self.options.track_line {
            self.write_track_line(&container)?;
        }
        match container.data {
            TrackData::Bed(rows) => {
                for row in &rows {
                    self.write_bed_row(row)?;
                }
            }
            TrackData::BedGraph(windows) => {
                for row in windows {
                    self.write_bedgraph_row(&row)?;
                }
            }
            TrackData::Txt { schema, records } => {
                if self.options.track_line {
                    self.write_schema(&schema)?;
                }
                for record in &records {
                    self.write_record(record)?;
                }
            }
        }
        Ok(())
    }

    /// Genome browser header line for the container.
    fn write_track_line(&mut self, container: &TrackContainer) -> Result<()> {
        let track = &container.track;
        let data_type = &container.data_type;
        match &container.data {
            TrackData::Bed(_) => writeln!(
                self.writer,
                "track type=bed name=\"{}_{}\" description=\"{} {}\" visibility=2 itemRgb=\"On\" priority=20",
                track, data_type, track, data_type
            )?,
            TrackData::BedGraph(_) => {
                let gradient = container.color.unwrap_or(Gradient::Blue);
                writeln!(
                    self.writer,
                    "track type=bedGraph name=\"{}_{}\" description=\"{}_{}\" visibility=full color={} altColor={} priority=20",
                    track,
                    data_type,
                    track,
                    data_type,
                    gradient.shade(7),
                    gradient.shade(8)
                )?
            }
            TrackData::Txt { .. } => {}
        }
        Ok(())
    }

    #[inline]
    fn write_int(&mut self, n: u64) -> Result<()> {
        self.writer.write_all(self.itoa_buf.format(n).as_bytes())?;
        Ok(())
    }

    #[inline]
    fn write_float(&mut self, f: f64) -> Result<()> {
        self.writer.write_all(self.ryu_buf.format(f).as_bytes())?;
        Ok(())
    }

    #[inline]
    fn write_tab(&mut self) -> Result<()> {
        self.writer.write_all(b"\t")?;
        Ok(())
    }

    /// Write one BED9 row.
    pub fn write_bed_row(&mut self, row: &BedRow) -> Result<()> {
        self.writer.write_all(row.chrom.as_bytes())?;
        self.write_tab()?;
        self.write_int(row.start)?;
        self.write_tab()?;
        self.write_int(row.end)?;
        self.write_tab()?;
        if self.options.bed_label {
            self.writer.write_all(row.name.as_bytes())?;
        } else {
            self.writer.write_all(b"\"\"")?;
        }
        self.write_tab()?;
        self.write_float(row.score)?;
        self.write_tab()?;
        let mut strand = [0u8; 4];
        self.writer
            .write_all(row.strand.encode_utf8(&mut strand).as_bytes())?;
        self.write_tab()?;
        self.write_int(row.thick_start)?;
        self.write_tab()?;
        self.write_int(row.thick_end)?;
        self.write_tab()?;
        self.writer.write_all(row.item_rgb.as_bytes())?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }

    /// Write one BedGraph row.
    pub fn write_bedgraph_row(&mut self, row: &BedGraphRow) -> Result<()> {
        self.writer.write_all(row.chrom.as_bytes())?;
        self.write_tab()?;
        self.write_int(row.start)?;
        self.write_tab()?;
        self.write_int(row.end)?;
        self.write_tab()?;
        self.write_float(row.value)?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }

    fn write_schema(&mut self, schema: &Schema) -> Result<()> {
        writeln!(self.writer, "#{}", schema.names().join("\t"))?;
        Ok(())
    }

    fn write_record(&mut self, record: &IntervalRecord) -> Result<()> {
        writeln!(self.writer, "{}", record)?;
        Ok(())
    }

    /// Flush the output buffer.
    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    /// Get the inner writer (flushes first).
    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| e.into_error().into())
    }
}

/// Write a container to `dir`, named `name` plus the format extension, or
/// [`TrackContainer::file_name`] when no name is given.
pub fn save_track<P: AsRef<Path>>(
    container: TrackContainer,
    dir: P,
    name: Option<&str>,
    options: WriteOptions,
) -> Result<PathBuf> {
    let file_name = match name {
        Some(n) => format!("{}{}", n, container.format().extension()),
        None => container.file_name(),
    };
    let path = dir.as_ref().join(file_name);

    let file = File::create(&path)?;
    let mut writer = TrackWriter::new(file, options);
    writer.write_track(container)?;
    writer.flush()?;

    info!("File {} generated", path.display());
    Ok(path)
}

/// Extension of the pseudo-chromosome sequence file.
pub const CHROM_EXTENSION: &str = ".fa";

/// Write a FASTA pseudo-chromosome `<chrom>.fa` of unknown bases, long
/// enough to hold every record of the dataset. Genome browsers load it
/// as the reference the tracks are drawn on.
pub fn write_chrom<P: AsRef<Path>>(dataset: &Dataset, dir: P, chrom: &str) -> Result<PathBuf> {
    let (_, length) = dataset.extent()?.ok_or_else(|| {
        TrackError::Configuration("no records to size the chromosome from".to_string())
    })?;
    let path = dir.as_ref().join(format!("{}{}", chrom, CHROM_EXTENSION));

    let mut writer = BufWriter::with_capacity(DEFAULT_BUFFER_SIZE, File::create(&path)?);
    writeln!(writer, ">{}", chrom)?;
    let block = [b'N'; 4096];
    let mut left = length;
    while left > 0 {
        let n = left.min(block.len() as u64) as usize;
        writer.write_all(&block[..n])?;
        left -= n as u64;
    }
    writer.write_all(b"\n")?;
    writer.flush()?;

    info!("Chromosome file {} generated ({} bases)", path.display(), length);
    Ok(path)
}
