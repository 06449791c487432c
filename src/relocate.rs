use std::io;
use std::path::Path;
use std::time::Instant;

/// Outcome of moving one file. A skip (destination exists, overwriting off)
/// is reportable but not an error; sizes and durations are only measured for
/// files that actually moved.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Relocation {
    pub moved: bool,
    pub skipped: bool,
    pub size_kb: f64,
    pub duration_secs: f64,
    pub dest_existed: bool,
}

impl Relocation {
    fn skip() -> Self {
        Relocation {
            moved: false,
            skipped: true,
            size_kb: 0.0,
            duration_secs: 0.0,
            dest_existed: true,
        }
    }
}

/// Moves `src` into `dest_dir` under its own base name. Honors `overwrite`:
/// with it off an existing destination file turns the move into a skip and
/// the source stays where it is. Errors are returned to the caller, which
/// logs and carries on with the next file; there are no retries.
pub async fn relocate(src: &Path, dest_dir: &Path, overwrite: bool) -> io::Result<Relocation> {
    let name = src.file_name().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("Source path {src:?} has no file name"),
        )
    })?;
    let future_path = dest_dir.join(name);

    let dest_existed = future_path.exists();
    if dest_existed && !overwrite {
        return Ok(Relocation::skip());
    }

    let size_kb = tokio::fs::metadata(src).await?.len() as f64 / 1000.0;

    let started = Instant::now();
    tokio::fs::rename(src, &future_path).await?;
    let duration_secs = started.elapsed().as_secs_f64();

    Ok(Relocation {
        moved: true,
        skipped: false,
        size_kb,
        duration_secs,
        dest_existed,
    })
}
