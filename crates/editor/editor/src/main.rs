// This is used for testing, at least for now. It's very hacky, but so be it.

use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};

use anyhow::{Context, Result};
use crossbeam::channel;
use mapcore_datatypes::ChunkedMap;
use mapcore_otbm::{read_header, read_map, write_map, ReadStats};
use mapcore_session::{MapCleanupService, MapInstance, MapSearchMode, MapSearchService};

fn main() {
    env_logger::init();

    let paths: Vec<String> = std::env::args().skip(1).collect();
    if paths.is_empty() {
        println!("usage: mapcore-editor <file.otbm> [file.otbm ...]");
        return;
    }

    // One worker thread per map, up to a small cap; each worker owns exactly one `ChunkedMap`
    // at a time, matching the single-threaded-per-map access model the rest of the workspace
    // assumes.
    const MAX_WORKERS: usize = 4;
    let num_workers = paths.len().min(MAX_WORKERS);

    let (path_sender, path_receiver) = channel::bounded::<(usize, String)>(paths.len());
    for (num, path) in paths.into_iter().enumerate() {
        path_sender.send((num, path)).expect("receiver is not dropped");
    }
    drop(path_sender);

    let threads: Vec<JoinHandle<_>> = (0..num_workers)
        .map(|_| {
            let path_receiver = path_receiver.clone();
            thread::spawn(move || {
                while let Ok((map_num, path)) = path_receiver.recv() {
                    if let Err(err) = process_map(map_num, Path::new(&path)) {
                        println!("In map {map_num} ({path}): {err:#}");
                    }
                }
            })
        })
        .collect();

    for thread in threads {
        thread.join().unwrap();
    }
}

fn process_map(map_num: usize, path: &Path) -> Result<()> {
    let header = read_header(path).with_context(|| format!("reading header of {}", path.display()))?;
    println!(
        "In map {map_num}: {}x{} tiles, otbm version {}, items {}.{}",
        header.width, header.height, header.version.otbm_version, header.version.items_major, header.version.items_minor,
    );

    let (map, stats) = read_map(path).with_context(|| format!("reading {}", path.display()))?;
    print_read_stats(map_num, &stats);

    let mut instance = MapInstance::new(map);
    instance.set_file_path(path.display().to_string());
    println!("In map {map_num}: loaded as \"{}\"", instance.display_name());

    demo_select_delete_undo(map_num, &mut instance);

    let hits = MapSearchService::search(instance.map(), "0", MapSearchMode::ByServerId, true, true, 5);
    println!("In map {map_num}: {} item(s) with server id 0 (sanity probe)", hits.len());

    let cleanup = MapCleanupService::remove_items_by_id(instance.map_mut(), &[]);
    println!(
        "In map {map_num}: cleanup scanned {} tile(s), removed {} item(s)",
        cleanup.tiles_processed, cleanup.items_removed,
    );

    round_trip_check(map_num, path, instance.map())?;

    Ok(())
}

/// Selects a single tile, deletes it, then undoes the delete — a cheap way to exercise the
/// selection/history path end to end without leaving the loaded map any different than it
/// started.
fn demo_select_delete_undo(map_num: usize, instance: &mut MapInstance) {
    instance.select_region(0, 0, 0, 0, mapcore_datatypes::GROUND_FLOOR);
    if instance.selection().is_empty() {
        return;
    }

    instance.delete_selection();
    match instance.undo() {
        Some(desc) => println!("In map {map_num}: exercised undo of \"{desc}\""),
        None => println!("In map {map_num}: delete_selection recorded nothing to undo"),
    }
}

fn print_read_stats(map_num: usize, stats: &ReadStats) {
    println!(
        "In map {map_num}: read {} tile(s), {} item(s), {} town(s), {} waypoint(s), {} creature(s); skipped {} tile(s), {} other entr(y/ies)",
        stats.tiles_read,
        stats.items_read,
        stats.towns_read,
        stats.waypoints_read,
        stats.creatures_read,
        stats.tiles_skipped,
        stats.entries_skipped,
    );
}

/// Writes the map back out next to the original (never overwriting it) and re-reads the
/// header, as a smoke test that the writer produces something the reader accepts.
fn round_trip_check(map_num: usize, original: &Path, map: &ChunkedMap) -> Result<()> {
    let mut round_trip_path = PathBuf::from(original);
    let suffix = round_trip_path.extension().and_then(|ext| ext.to_str()).unwrap_or("otbm");
    round_trip_path.set_extension(format!("roundtrip.{suffix}"));

    write_map(&round_trip_path, map).with_context(|| format!("writing {}", round_trip_path.display()))?;
    read_header(&round_trip_path).with_context(|| format!("re-reading {}", round_trip_path.display()))?;
    println!("In map {map_num}: round-trip write/read through {} succeeded", round_trip_path.display());

    Ok(())
}
