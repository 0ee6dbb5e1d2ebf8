use super::test_helpers::*;
use super::*;
use crate::artifact_store::PARTIAL_SUFFIX;
use crate::error::Error;
use crate::types::JobStatus;
use bytes::Bytes;
use std::sync::atomic::Ordering;
use std::time::Duration;


/// Bytes of `n` chunks of `size` bytes each
fn chunks(n: usize, size: usize) -> Vec<std::io::Result<Bytes>> {
    (0..n).map(|i| Ok(Bytes::from(vec![i as u8; size]))).collect()
}

/// True if any `.part` file is left in the download directory
fn has_partial_files(downloader: &MediaDownloader) -> bool {
    std::fs::read_dir(downloader.store().root())
        .unwrap()
        .filter_map(|entry| entry.ok())
        .any(|entry| entry.file_name().to_string_lossy().ends_with(PARTIAL_SUFFIX))
}
