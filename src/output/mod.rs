//! Plain-text plot output.
//!
//! One file per channel. Each time frame starts with a `# t = <value>`
//! header, followed by nOut+1 whitespace-separated sample rows
//! `x u q σ u̇ q̇ σ̇`, and a blank line closes the frame. The primary
//! channel writes `<configname>.plot`; channel v ≥ 1 writes `u_t_<v>.plot`.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::solver::SystemSolver;
use crate::state::Block;

/// Default number of sample intervals per frame.
pub const DEFAULT_SAMPLES: usize = 300;

/// Write one time frame for one channel.
pub fn write_frame<W: Write>(
    out: &mut W,
    system: &SystemSolver,
    t: f64,
    n_out: usize,
    var: usize,
    y: &[f64],
    yp: &[f64],
) -> io::Result<()> {
    let grid = system.grid();
    writeln!(out, "# t = {}", t)?;
    for i in 0..=n_out {
        let x = grid.x_min + grid.length() * i as f64 / n_out as f64;
        writeln!(
            out,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}",
            x,
            system.eval(y, Block::U, var, x),
            system.eval(y, Block::Q, var, x),
            system.eval(y, Block::Sigma, var, x),
            system.eval(yp, Block::U, var, x),
            system.eval(yp, Block::Q, var, x),
            system.eval(yp, Block::Sigma, var, x),
        )?;
    }
    writeln!(out)
}

/// Per-channel plot files of a run.
pub struct PlotFiles {
    writers: Vec<BufWriter<File>>,
}

impl PlotFiles {
    /// Create the plot files next to the configuration file: the primary
    /// channel uses the configuration stem, additional channels
    /// `u_t_<v>.plot`.
    pub fn create(config_path: &Path, n_vars: usize) -> io::Result<Self> {
        let mut writers = Vec::with_capacity(n_vars);
        let primary = config_path.with_extension("plot");
        writers.push(BufWriter::new(File::create(primary)?));
        for var in 1..n_vars {
            let name = format!("u_t_{}.plot", var);
            let sibling = match config_path.parent() {
                Some(dir) if !dir.as_os_str().is_empty() => dir.join(&name),
                _ => std::path::PathBuf::from(&name),
            };
            writers.push(BufWriter::new(File::create(sibling)?));
        }
        Ok(Self { writers })
    }

    /// Append one frame to every channel file.
    pub fn write_frames(
        &mut self,
        system: &SystemSolver,
        t: f64,
        n_out: usize,
        y: &[f64],
        yp: &[f64],
    ) -> io::Result<()> {
        for (var, out) in self.writers.iter_mut().enumerate() {
            write_frame(out, system, t, n_out, var, y, yp)?;
        }
        Ok(())
    }

    /// Flush all files.
    pub fn flush(&mut self) -> io::Result<()> {
        for w in &mut self.writers {
            w.flush()?;
        }
        Ok(())
    }
}
