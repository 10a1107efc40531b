use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use duel_shared::{Command, TelemetryFrame};

pub const RECORD_HEADER: &str = "timer,x1,z1,b1,h1,p1,x2,z2,b2,h2,p2,st,th,turdecl,turbear";

/// CSV log of one episode: both participants' pose and status plus the command sent.
/// Each row is flushed as it is written.
pub struct EpisodeRecorder<W: Write = BufWriter<File>> {
    writer: W,
    rows: u64,
}

impl EpisodeRecorder<BufWriter<File>> {
    /// Create `episode.<timestamp>.dat` inside `dir`, creating the directory if needed.
    pub fn create(dir: &Path) -> io::Result<(Self, PathBuf)> {
        fs::create_dir_all(dir)?;
        let stamp = chrono::Local::now().format("%Y-%m-%d-%H-%M-%S");
        let path = dir.join(format!("episode.{stamp}.dat"));
        let file = File::create(&path)?;
        let recorder = Self::new(BufWriter::new(file))?;
        Ok((recorder, path))
    }
}

impl<W: Write> EpisodeRecorder<W> {
    pub fn new(mut writer: W) -> io::Result<Self> {
        writeln!(writer, "{RECORD_HEADER}")?;
        writer.flush()?;
        Ok(Self { writer, rows: 0 })
    }

    pub fn record(&mut self, me: &TelemetryFrame, enemy: &TelemetryFrame, command: &Command) -> io::Result<()> {
        writeln!(
            self.writer,
            "{},{},{},{},{},{},{},{},{},{},{},{},{},{},{}",
            me.timer,
            me.x,
            me.z,
            me.bearing,
            me.health,
            me.power,
            enemy.x,
            enemy.z,
            enemy.bearing,
            enemy.health,
            enemy.power,
            command.steering,
            command.thrust,
            command.turret_declination,
            command.turret_bearing,
        )?;
        self.writer.flush()?;
        self.rows += 1;
        Ok(())
    }

    pub fn rows(&self) -> u64 {
        self.rows
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}
