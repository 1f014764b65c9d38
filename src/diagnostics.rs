//! Mission logging: one CSV row per plant tick, matching the original
//! `SystemLogger` format (`t,x,y,z,ux,uy,uz,t1,t2,t3`, three decimals).

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use nalgebra::Vector3;

/// Something the plant loop can hand a tick's worth of state to.
pub trait Sink {
    fn save(
        &mut self,
        position: &Vector3<f64>,
        command: &Vector3<f64>,
        joints: &Vector3<f64>,
        t: f64,
    ) -> io::Result<()>;
}

/// Writes one row per `save` call to a CSV file, flushing eagerly since the
/// plant loop runs for the lifetime of the process.
pub struct CsvSink {
    writer: BufWriter<File>,
}

impl CsvSink {
    pub fn create(path: impl AsRef<Path>) -> io::Result<Self> {
        let mut writer = BufWriter::new(File::create(path)?);
        writeln!(writer, "t,x,y,z,ux,uy,uz,t1,t2,t3")?;
        Ok(Self { writer })
    }
}

impl Sink for CsvSink {
    fn save(
        &mut self,
        position: &Vector3<f64>,
        command: &Vector3<f64>,
        joints: &Vector3<f64>,
        t: f64,
    ) -> io::Result<()> {
        writeln!(
            self.writer,
            "{:.3},{:.3},{:.3},{:.3},{:.3},{:.3},{:.3},{:.3},{:.3},{:.3}",
            t,
            position[0],
            position[1],
            position[2],
            command[0],
            command[1],
            command[2],
            joints[0],
            joints[1],
            joints[2],
        )?;
        self.writer.flush()
    }
}
