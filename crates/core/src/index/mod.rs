//! Groups acquired files into a navigable two-level structure.
//!
//! A group is the top-level subdirectory a file was written to (or
//! [`ROOT_GROUP`] for files directly in the job directory). Within a group,
//! files are split into posts by the numeric id embedded in names like
//! `site_user_<post>_<index>.jpg`; anything else lands in [`MISC_POST`].

use once_cell::sync::Lazy;
use regex_lite::Regex;
use serde::Serialize;
use std::path::{Component, Path, PathBuf};

/// Group of files written directly into the job directory.
pub const ROOT_GROUP: &str = "_root";

/// Post holding every file of a group whose name carries no post id.
pub const MISC_POST: &str = "misc";

static POST_PATTERN: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"_(\d+)_(\d+)\.[A-Za-z0-9]+$").ok());

/// Files sharing a post id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Post {
    pub id: String,
    pub files: Vec<PathBuf>,
}

/// Files sharing a top-level directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Group {
    pub name: String,
    /// Holds the files written directly into the job directory.
    pub root: bool,
    /// Every file of the group, in discovery order.
    pub files: Vec<PathBuf>,
    pub posts: Vec<Post>,
}

impl Group {
    /// Directory holding the group's files, `None` for the root group.
    pub fn dir(&self, base_dir: &Path) -> Option<PathBuf> {
        (!self.root).then(|| base_dir.join(&self.name))
    }
}

/// Index of one job's acquired files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Index {
    pub job_id: String,
    pub base_dir: PathBuf,
    pub groups: Vec<Group>,
}

impl Index {
    pub fn group(&self, gi: usize) -> Option<&Group> {
        self.groups.get(gi)
    }

    pub fn post(&self, gi: usize, pi: usize) -> Option<&Post> {
        self.group(gi).and_then(|g| g.posts.get(pi))
    }

    pub fn total_files(&self) -> usize {
        self.groups.iter().map(|g| g.files.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Drops a group's files from the index, keeping positions stable so
    /// outstanding callbacks still address the same groups.
    pub fn clear_group(&mut self, gi: usize) -> Option<Vec<PathBuf>> {
        let group = self.groups.get_mut(gi)?;
        group.posts.clear();
        Some(std::mem::take(&mut group.files))
    }

    /// Drops `files` wherever they appear. Groups and posts keep their
    /// positions even when emptied.
    pub fn remove_files(&mut self, files: &[PathBuf]) {
        for group in &mut self.groups {
            group.files.retain(|f| !files.contains(f));
            for post in &mut group.posts {
                post.files.retain(|f| !files.contains(f));
            }
        }
    }
}

/// Post id captured from a file name, if it follows the post pattern.
pub fn post_key(file_name: &str) -> Option<String> {
    POST_PATTERN
        .as_ref()?
        .captures(file_name)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Top-level directory of `file`, `None` for files in the base directory.
fn group_key(base_dir: &Path, file: &Path) -> Option<String> {
    let relative = file.strip_prefix(base_dir).ok()?;
    let components: Vec<Component<'_>> = relative.components().collect();
    match components.as_slice() {
        [Component::Normal(first), _, ..] => Some(first.to_string_lossy().into_owned()),
        _ => None,
    }
}

/// Builds the index for `files`, preserving their order.
///
/// Every file lands in exactly one group and one post, and the same input
/// always produces the same index.
pub fn build_index(job_id: &str, base_dir: &Path, files: &[PathBuf]) -> Index {
    let mut groups: Vec<Group> = Vec::new();

    for file in files {
        let key = group_key(base_dir, file);
        let found = groups
            .iter()
            .position(|g| {
                g.root == key.is_none() && key.as_deref().map_or(true, |k| g.name == k)
            });
        let gi = match found {
            Some(gi) => gi,
            None => {
                groups.push(Group {
                    root: key.is_none(),
                    name: key.unwrap_or_else(|| ROOT_GROUP.to_string()),
                    files: Vec::new(),
                    posts: Vec::new(),
                });
                groups.len() - 1
            }
        };
        let group = &mut groups[gi];
        group.files.push(file.clone());

        let post_id = file
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(post_key)
            .unwrap_or_else(|| MISC_POST.to_string());
        match group.posts.iter_mut().find(|p| p.id == post_id) {
            Some(post) => post.files.push(file.clone()),
            None => group.posts.push(Post {
                id: post_id,
                files: vec![file.clone()],
            }),
        }
    }

    Index {
        job_id: job_id.to_string(),
        base_dir: base_dir.to_path_buf(),
        groups,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths(base: &Path, rel: &[&str]) -> Vec<PathBuf> {
        rel.iter().map(|r| base.join(r)).collect()
    }

    #[test]
    fn test_post_key() {
        assert_eq!(
            post_key("fapopello_some_user_77_0.jpg").as_deref(),
            Some("77")
        );
        assert_eq!(post_key("x_12_3.MP4").as_deref(), Some("12"));
        assert_eq!(post_key("photo.jpg"), None);
        assert_eq!(post_key("clip_12.mp4"), None);
    }

    #[test]
    fn test_groups_and_posts() {
        let base = Path::new("/dl/job");
        let files = paths(
            base,
            &[
                "setA/site_u_77_0.jpg",
                "setB/cover.jpg",
                "setA/site_u_77_1.jpg",
                "setA/site_u_80_0.mp4",
                "loose.png",
            ],
        );

        let index = build_index("job1", base, &files);

        let names: Vec<&str> = index.groups.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["setA", "setB", ROOT_GROUP]);

        let set_a = &index.groups[0];
        assert_eq!(set_a.files.len(), 3);
        assert_eq!(set_a.posts.len(), 2);
        assert_eq!(set_a.posts[0].id, "77");
        assert_eq!(
            set_a.posts[0].files,
            paths(base, &["setA/site_u_77_0.jpg", "setA/site_u_77_1.jpg"])
        );
        assert_eq!(set_a.posts[1].id, "80");

        let set_b = &index.groups[1];
        assert_eq!(set_b.posts.len(), 1);
        assert_eq!(set_b.posts[0].id, MISC_POST);

        assert_eq!(index.total_files(), files.len());
        assert_eq!(set_a.dir(base), Some(base.join("setA")));
        assert_eq!(index.groups[2].dir(base), None);
    }

    #[test]
    fn test_partition_and_idempotence() {
        let base = Path::new("/dl/job");
        let files = paths(
            base,
            &[
                "a/x_1_0.jpg",
                "a/deep/nested/x_1_1.jpg",
                "b/y.mp4",
                "z.jpg",
                "a/w.jpg",
            ],
        );

        let first = build_index("j", base, &files);
        let second = build_index("j", base, &files);
        assert_eq!(first, second);

        let mut seen: Vec<PathBuf> = first
            .groups
            .iter()
            .flat_map(|g| g.posts.iter().flat_map(|p| p.files.clone()))
            .collect();
        seen.sort();
        let mut expected = files.clone();
        expected.sort();
        assert_eq!(seen, expected);

        // Nested files belong to their top-level directory.
        assert_eq!(first.groups[0].name, "a");
        assert_eq!(first.groups[0].files.len(), 3);
    }

    #[test]
    fn test_file_outside_base_goes_to_root() {
        let index = build_index("j", Path::new("/dl/job"), &[PathBuf::from("/elsewhere/f.jpg")]);
        assert_eq!(index.groups[0].name, ROOT_GROUP);
        assert!(index.groups[0].root);
    }

    #[test]
    fn test_directory_named_like_root_group_stays_separate() {
        let base = Path::new("/dl/job");
        let files = paths(base, &["loose.jpg", "_root/inner.jpg"]);

        let index = build_index("j", base, &files);

        assert_eq!(index.groups.len(), 2);
        assert!(index.groups[0].root);
        assert_eq!(index.groups[0].dir(base), None);
        assert!(!index.groups[1].root);
        assert_eq!(index.groups[1].name, "_root");
        assert_eq!(index.groups[1].dir(base), Some(base.join("_root")));
        assert_eq!(index.groups[1].files, vec![base.join("_root/inner.jpg")]);
    }

    #[test]
    fn test_clear_group_keeps_positions() {
        let base = Path::new("/dl/job");
        let mut index = build_index("j", base, &paths(base, &["a/1.jpg", "b/2.jpg"]));

        let removed = index.clear_group(0).unwrap();
        assert_eq!(removed, vec![base.join("a/1.jpg")]);
        assert_eq!(index.groups.len(), 2);
        assert!(index.groups[0].files.is_empty());
        assert_eq!(index.groups[1].name, "b");
        assert!(index.clear_group(5).is_none());
    }

    #[test]
    fn test_remove_files_empties_posts_in_place() {
        let base = Path::new("/dl/job");
        let files = paths(base, &["a/s_u_1_0.jpg", "a/s_u_1_1.jpg", "a/s_u_2_0.jpg"]);
        let mut index = build_index("j", base, &files);

        index.remove_files(&files[..2]);
        assert_eq!(index.groups[0].posts.len(), 2);
        assert!(index.post(0, 0).unwrap().files.is_empty());
        assert_eq!(index.post(0, 1).unwrap().files, vec![files[2].clone()]);
        assert_eq!(index.total_files(), 1);

        index.remove_files(&files[2..]);
        assert_eq!(index.total_files(), 0);
    }

    #[test]
    fn test_empty_input() {
        let index = build_index("j", Path::new("/dl"), &[]);
        assert!(index.is_empty());
        assert!(index.post(0, 0).is_none());
    }
}
