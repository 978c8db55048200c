//! Loading course files into a [`CourseIndex`].

use std::path::Path;

use tracing::{info, warn};

use super::{course_files, read_course_file};
use crate::error::Result;
use crate::search::CourseIndex;

/// Index one course file. Returns `(courses, chunks)` added; a course whose
/// title is already indexed is skipped as `(0, 0)`.
pub async fn index_course_file(
    index: &dyn CourseIndex,
    path: &Path,
    chunk_size: usize,
    chunk_overlap: usize,
) -> Result<(usize, usize)> {
    let (course, chunks) = read_course_file(path, chunk_size, chunk_overlap)?;

    if index.course(&course.title).await.is_some() {
        info!(title = %course.title, "course already indexed, skipping");
        return Ok((0, 0));
    }

    let added = chunks.len();
    info!(title = %course.title, chunks = added, "indexed course");
    index.add_course(course, chunks).await?;
    Ok((1, added))
}

/// Index every course file in `dir`. Unreadable files are skipped and a
/// missing folder loads nothing.
pub async fn index_course_folder(
    index: &dyn CourseIndex,
    dir: &Path,
    chunk_size: usize,
    chunk_overlap: usize,
    clear_existing: bool,
) -> Result<(usize, usize)> {
    if !dir.is_dir() {
        warn!(path = %dir.display(), "course folder not found");
        return Ok((0, 0));
    }
    if clear_existing {
        index.clear().await?;
    }

    let mut totals = (0, 0);
    for path in course_files(dir)? {
        match index_course_file(index, &path, chunk_size, chunk_overlap).await {
            Ok((courses, chunks)) => {
                totals.0 += courses;
                totals.1 += chunks;
            }
            Err(e) => warn!(path = %path.display(), error = %e, "skipping course file"),
        }
    }

    info!(courses = totals.0, chunks = totals.1, "course folder loaded");
    Ok(totals)
}
