#![allow(dead_code)]

use audiofolder::FileRef;
use proptest::prelude::*;
use proptest::strategy::BoxedStrategy;
use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence};

pub fn proptest_config() -> ProptestConfig {
    let cases = std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(64);

    let mut config = ProptestConfig::with_failure_persistence(FileFailurePersistence::WithSource(
        "proptest-regressions",
    ));
    config.cases = cases;
    config.max_shrink_iters = 1024;
    config
}

/// A media file at `dir/name` (or `name` when `dir` is empty).
#[derive(Clone, Debug, PartialEq)]
pub struct MediaSeed {
    pub dir: String,
    pub name: String,
}

impl MediaSeed {
    pub fn relative_path(&self) -> String {
        if self.dir.is_empty() {
            self.name.clone()
        } else {
            format!("{}/{}", self.dir, self.name)
        }
    }

    pub fn to_file_ref(&self) -> FileRef {
        let rel = self.relative_path();
        FileRef::plain(&rel, format!("/data/{rel}"))
    }

    /// The directory component immediately enclosing the file.
    pub fn enclosing(&self) -> Option<&str> {
        self.dir.rsplit('/').next().filter(|last| !last.is_empty())
    }
}

pub fn drop_flag_strategy() -> BoxedStrategy<Option<bool>> {
    prop_oneof![Just(None), Just(Some(true)), Just(Some(false))].boxed()
}

/// Media files that all sit inside at least one directory.
pub fn arb_grouped_media(max_files: usize) -> BoxedStrategy<Vec<MediaSeed>> {
    proptest::collection::vec(
        (dir_path_strategy(), media_name_strategy())
            .prop_map(|(dir, name)| MediaSeed { dir, name }),
        1..=max_files,
    )
    .boxed()
}

/// Grouped media plus at least one file at the split root.
pub fn arb_media_with_root_file(max_files: usize) -> BoxedStrategy<Vec<MediaSeed>> {
    (arb_grouped_media(max_files), media_name_strategy(), any::<prop::sample::Index>())
        .prop_map(|(mut media, name, at)| {
            let position = at.index(media.len() + 1);
            media.insert(
                position,
                MediaSeed {
                    dir: String::new(),
                    name,
                },
            );
            media
        })
        .boxed()
}

fn dir_path_strategy() -> BoxedStrategy<String> {
    proptest::collection::vec(dir_name_strategy(), 1..=3)
        .prop_map(|parts| parts.join("/"))
        .boxed()
}

fn dir_name_strategy() -> BoxedStrategy<String> {
    proptest::string::string_regex("[A-Za-z0-9_-]{1,8}")
        .expect("valid directory name regex")
        .boxed()
}

fn media_name_strategy() -> BoxedStrategy<String> {
    proptest::string::string_regex("[a-z0-9_]{1,10}\\.(wav|mp3|flac)")
        .expect("valid media name regex")
        .boxed()
}
