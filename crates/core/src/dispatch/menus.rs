//! Inline keyboards and texts of the interactive menus.

use super::callback::{Callback, PreMode};
use crate::index::{Group, Index, Post};
use crate::media::DeliveryMode;
use crate::transport::{InlineButton, Keyboard};

/// Modes offered on the per-item keyboard of delivered videos.
pub const ITEM_MODES: [DeliveryMode; 4] = [
    DeliveryMode::Hd,
    DeliveryMode::Sd,
    DeliveryMode::Compress,
    DeliveryMode::Screenshots,
];

/// Modes offered on a post menu.
pub const POST_MODES: [DeliveryMode; 5] = [
    DeliveryMode::Original,
    DeliveryMode::Hd,
    DeliveryMode::Sd,
    DeliveryMode::Compress,
    DeliveryMode::Screenshots,
];

/// Visible slice of a paginated list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    /// Page actually shown, clamped to the last one.
    pub page: usize,
    pub pages: usize,
    pub start: usize,
    pub end: usize,
}

impl PageWindow {
    pub fn new(total: usize, page: usize, page_size: usize) -> Self {
        let size = page_size.max(1);
        let pages = total.div_ceil(size).max(1);
        let page = page.min(pages - 1);
        let start = page * size;
        Self {
            page,
            pages,
            start,
            end: (start + size).min(total),
        }
    }

    pub fn has_prev(&self) -> bool {
        self.page > 0
    }

    pub fn has_next(&self) -> bool {
        self.page + 1 < self.pages
    }
}

fn button(label: impl Into<String>, callback: Callback) -> InlineButton {
    InlineButton::new(label, callback.encode())
}

fn nav_row(window: &PageWindow, to_page: impl Fn(usize) -> Callback) -> Vec<InlineButton> {
    let mut row = Vec::new();
    if window.has_prev() {
        row.push(button("◀️ Prev", to_page(window.page - 1)));
    }
    if window.has_next() {
        row.push(button("Next ▶️", to_page(window.page + 1)));
    }
    row
}

/// Mode selection shown when a link arrives.
pub fn mode_menu(job: &str) -> Keyboard {
    let pre = |mode: PreMode| {
        let label = match mode {
            PreMode::Deliver(m) => m.label(),
            PreMode::Index => "🗂 Browse",
        };
        button(
            label,
            Callback::Pre {
                job: job.to_string(),
                mode,
            },
        )
    };
    use DeliveryMode::*;
    Keyboard::new()
        .row(vec![pre(PreMode::Deliver(Original)), pre(PreMode::Index)])
        .row(vec![
            pre(PreMode::Deliver(Hd)),
            pre(PreMode::Deliver(Sd)),
            pre(PreMode::Deliver(Lq)),
        ])
        .row(vec![
            pre(PreMode::Deliver(Compress)),
            pre(PreMode::Deliver(Lossless)),
        ])
        .row(vec![
            pre(PreMode::Deliver(Screenshots)),
            pre(PreMode::Deliver(Trim)),
        ])
}

/// After-retrieval controls bound to an item token.
fn item_row(token: &str, prefix: &str) -> Vec<InlineButton> {
    ITEM_MODES
        .iter()
        .map(|mode| {
            button(
                format!("{}{}", prefix, mode.label()),
                Callback::Item {
                    token: token.to_string(),
                    mode: *mode,
                },
            )
        })
        .collect()
}

pub fn item_keyboard(token: &str) -> Keyboard {
    Keyboard::new().row(item_row(token, ""))
}

pub fn groups_text(index: &Index, window: &PageWindow) -> String {
    format!(
        "📂 {} group(s), {} file(s). Page {}/{}",
        index.groups.len(),
        index.total_files(),
        window.page + 1,
        window.pages
    )
}

pub fn groups_keyboard(index: &Index, window: &PageWindow) -> Keyboard {
    let job = &index.job_id;
    let mut keyboard = Keyboard::new();
    for gi in window.start..window.end {
        let group = &index.groups[gi];
        keyboard = keyboard.row(vec![button(
            format!("📁 {} ({})", group.name, group.files.len()),
            Callback::Group {
                job: job.clone(),
                group: gi,
                page: 0,
            },
        )]);
    }
    keyboard.row(nav_row(window, |page| Callback::Groups {
        job: job.clone(),
        page,
    }))
}

pub fn group_text(group: &Group, window: &PageWindow) -> String {
    format!(
        "📁 {}: {} post(s), {} file(s). Page {}/{}",
        group.name,
        group.posts.len(),
        group.files.len(),
        window.page + 1,
        window.pages
    )
}

pub fn group_keyboard(job: &str, gi: usize, group: &Group, window: &PageWindow) -> Keyboard {
    let mut keyboard = Keyboard::new();
    for pi in window.start..window.end {
        let post = &group.posts[pi];
        keyboard = keyboard.row(vec![button(
            format!("🧾 {} ({})", post.id, post.files.len()),
            Callback::Post {
                job: job.to_string(),
                group: gi,
                post: pi,
            },
        )]);
    }
    keyboard
        .row(nav_row(window, |page| Callback::Group {
            job: job.to_string(),
            group: gi,
            page,
        }))
        .row(vec![
            button(
                "⬇️ Send all",
                Callback::SendGroup {
                    job: job.to_string(),
                    group: gi,
                    mode: DeliveryMode::Original,
                },
            ),
            button(
                "🗜 Send compressed",
                Callback::SendGroup {
                    job: job.to_string(),
                    group: gi,
                    mode: DeliveryMode::Compress,
                },
            ),
        ])
        .row(vec![
            button(
                "🧹 Clean up",
                Callback::CleanGroup {
                    job: job.to_string(),
                    group: gi,
                },
            ),
            button(
                "⬅️ Back",
                Callback::Groups {
                    job: job.to_string(),
                    page: 0,
                },
            ),
        ])
}

pub fn post_text(group: &Group, post: &Post) -> String {
    format!(
        "🧾 Post {} in {}: {} file(s)",
        post.id,
        group.name,
        post.files.len()
    )
}

/// Post menu: bulk modes, then one re-delivery row per `(position, token)`
/// item, then the way back.
pub fn post_keyboard(
    job: &str,
    gi: usize,
    pi: usize,
    page_size: usize,
    items: &[(usize, String)],
) -> Keyboard {
    let modes: Vec<InlineButton> = POST_MODES
        .iter()
        .map(|mode| {
            button(
                mode.label(),
                Callback::SendPost {
                    job: job.to_string(),
                    group: gi,
                    post: pi,
                    mode: *mode,
                },
            )
        })
        .collect();
    let (first, second) = modes.split_at(modes.len().min(3));
    let keyboard = items.iter().fold(
        Keyboard::new().row(first.to_vec()).row(second.to_vec()),
        |keyboard, (position, token)| keyboard.row(item_row(token, &format!("#{} ", position))),
    );
    keyboard.button(
            "⬅️ Back",
            Callback::Group {
                job: job.to_string(),
                group: gi,
                page: pi / page_size.max(1),
            }
            .encode(),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::build_index;
    use std::path::{Path, PathBuf};

    #[test]
    fn test_page_window() {
        let w = PageWindow::new(20, 0, 8);
        assert_eq!((w.start, w.end, w.pages), (0, 8, 3));
        assert!(!w.has_prev());
        assert!(w.has_next());

        let w = PageWindow::new(20, 2, 8);
        assert_eq!((w.start, w.end), (16, 20));
        assert!(!w.has_next());

        let w = PageWindow::new(20, 99, 8);
        assert_eq!(w.page, 2);

        let w = PageWindow::new(0, 0, 8);
        assert_eq!((w.start, w.end, w.pages), (0, 0, 1));
    }

    #[test]
    fn test_mode_menu_offers_every_mode() {
        let keyboard = mode_menu("job1");
        let data: Vec<&str> = keyboard.buttons().map(|b| b.data.as_str()).collect();
        assert_eq!(data.len(), 9);
        assert!(data.contains(&"pre:job1:idx"));
        assert!(data.contains(&"pre:job1:orig"));
        assert!(data.contains(&"pre:job1:trim"));
    }

    #[test]
    fn test_item_keyboard() {
        let data: Vec<String> = item_keyboard("tok")
            .buttons()
            .map(|b| b.data.clone())
            .collect();
        assert_eq!(data, vec!["va:tok:hd", "va:tok:sd", "va:tok:cmp", "va:tok:shots"]);
    }

    #[test]
    fn test_group_keyboard_pagination() {
        let base = Path::new("/dl/j");
        let files: Vec<PathBuf> = (0..10)
            .map(|i| base.join(format!("set/x_{}_0.jpg", i)))
            .collect();
        let index = build_index("j", base, &files);
        let group = &index.groups[0];

        let window = PageWindow::new(group.posts.len(), 1, 8);
        let keyboard = group_keyboard("j", 0, group, &window);
        let data: Vec<&str> = keyboard.buttons().map(|b| b.data.as_str()).collect();

        assert_eq!(data[0], "jp:j:0:8");
        assert_eq!(data[1], "jp:j:0:9");
        assert!(data.contains(&"jg:j:0:0"));
        assert!(!data.contains(&"jg:j:0:2"));
        assert!(data.contains(&"ag:j:0:orig"));
        assert!(data.contains(&"clg:j:0"));
        assert!(data.contains(&"jl:j:0"));
        assert!(group_text(group, &window).contains("Page 2/2"));
    }

    #[test]
    fn test_post_keyboard_back_to_page() {
        let keyboard = post_keyboard("j", 1, 9, 8, &[]);
        let data: Vec<&str> = keyboard.buttons().map(|b| b.data.as_str()).collect();
        assert_eq!(data.len(), 6);
        assert_eq!(data[0], "ap:j:1:9:orig");
        assert_eq!(data.last(), Some(&"jg:j:1:1"));
    }

    #[test]
    fn test_post_keyboard_item_rows() {
        let items = vec![(2, "tokA".to_string()), (5, "tokB".to_string())];
        let keyboard = post_keyboard("j", 0, 0, 8, &items);
        assert_eq!(keyboard.rows.len(), 5);

        let first = &keyboard.rows[2];
        assert_eq!(first.len(), ITEM_MODES.len());
        assert_eq!(first[0].data, "va:tokA:hd");
        assert!(first[0].label.starts_with("#2 "));
        assert_eq!(keyboard.rows[3][3].data, "va:tokB:shots");
        assert_eq!(keyboard.rows[4][0].data, "jg:j:0:0");
    }
}
