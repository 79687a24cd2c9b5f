use std::cmp::Ordering;

use itertools::Itertools;

use crate::api::{ApiClient, User};
use crate::output::{self, OutputFormat, Table};
use crate::toast::Severity;
use crate::ui::Ui;
use crate::utils;

pub const PAGE_SIZE: usize = 12;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortKey {
    Id,
    Name,
    Email,
    Proxy,
    Salary,
}

impl SortKey {
    pub const ALL: [SortKey; 5] = [
        SortKey::Id,
        SortKey::Name,
        SortKey::Email,
        SortKey::Proxy,
        SortKey::Salary,
    ];

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "id" | "user_id" => Some(Self::Id),
            "name" => Some(Self::Name),
            "email" => Some(Self::Email),
            "proxy" => Some(Self::Proxy),
            "salary" => Some(Self::Salary),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SortKey::Id => "ID",
            SortKey::Name => "Name",
            SortKey::Email => "Email",
            SortKey::Proxy => "Proxy",
            SortKey::Salary => "Salary",
        }
    }

    fn value<'a>(&self, user: &'a User) -> Option<&'a str> {
        match self {
            SortKey::Id => Some(user.user_id.as_str()),
            SortKey::Name => Some(user.name.as_str()),
            SortKey::Email => user.email.as_deref(),
            SortKey::Proxy => user.proxy.as_deref(),
            SortKey::Salary => user.salary.as_deref(),
        }
        .filter(|v| !v.is_empty())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn arrow(&self) -> &'static str {
        match self {
            SortDirection::Asc => "^",
            SortDirection::Desc => "v",
        }
    }
}

/// Sort value for one cell. Variant order is the sort order: missing values
/// first, then numbers, then text.
#[derive(Debug, PartialEq, PartialOrd)]
enum Cell {
    Missing,
    Number(f64),
    Text(String),
}

impl Cell {
    fn of(value: Option<&str>) -> Self {
        match value {
            None => Cell::Missing,
            Some(raw) => match raw.trim().parse::<f64>() {
                Ok(n) if n.is_finite() => Cell::Number(n),
                _ => Cell::Text(raw.to_lowercase()),
            },
        }
    }
}

fn compare_values(a: Option<&str>, b: Option<&str>) -> Ordering {
    Cell::of(a)
        .partial_cmp(&Cell::of(b))
        .unwrap_or(Ordering::Equal)
}

/// Client-side search, sort and pagination over a list fetched once.
#[derive(Clone, Debug)]
pub struct UsersView {
    all: Vec<User>,
    visible: Vec<usize>,
    search: String,
    sort: Option<(SortKey, SortDirection)>,
    page: usize,
    page_size: usize,
    loaded: bool,
}

impl Default for UsersView {
    fn default() -> Self {
        Self::new(PAGE_SIZE)
    }
}

impl UsersView {
    pub fn new(page_size: usize) -> Self {
        Self {
            all: Vec::new(),
            visible: Vec::new(),
            search: String::new(),
            sort: None,
            page: 1,
            page_size: page_size.max(1),
            loaded: false,
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Fetches the full list. On failure the previous list stays and a toast
    /// is raised.
    pub async fn load(&mut self, client: &ApiClient, ui: &mut Ui) -> bool {
        let pb = ui.spinner("Loading users...");
        let result = client.users().await;
        pb.finish_and_clear();
        match result {
            Ok(users) => {
                self.set_users(users);
                true
            }
            Err(e) => {
                ui.toast(
                    format!("Failed to load users: {}", e.user_message()),
                    Severity::Error,
                );
                false
            }
        }
    }

    pub fn set_users(&mut self, users: Vec<User>) {
        self.all = users;
        self.loaded = true;
        self.refresh();
    }

    pub fn set_search(&mut self, term: &str) {
        self.search = term.trim().to_lowercase();
        self.refresh();
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    /// Same column again flips the direction, a new column starts ascending.
    pub fn sort_by(&mut self, key: SortKey) {
        self.sort = match self.sort {
            Some((current, SortDirection::Asc)) if current == key => {
                Some((key, SortDirection::Desc))
            }
            Some((current, SortDirection::Desc)) if current == key => {
                Some((key, SortDirection::Asc))
            }
            _ => Some((key, SortDirection::Asc)),
        };
        self.refresh();
    }

    pub fn sort(&self) -> Option<(SortKey, SortDirection)> {
        self.sort
    }

    pub fn set_page(&mut self, page: usize) {
        self.page = utils::clamp_page(page, self.visible.len(), self.page_size);
    }

    pub fn next_page(&mut self) -> bool {
        let before = self.page;
        self.set_page(self.page + 1);
        self.page != before
    }

    pub fn prev_page(&mut self) -> bool {
        let before = self.page;
        self.set_page(self.page.saturating_sub(1));
        self.page != before
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_count(&self) -> usize {
        utils::page_count(self.visible.len(), self.page_size)
    }

    pub fn filtered_len(&self) -> usize {
        self.visible.len()
    }

    pub fn total_len(&self) -> usize {
        self.all.len()
    }

    /// Every user matching the search, in sort order.
    pub fn filtered(&self) -> Vec<&User> {
        self.visible.iter().map(|&i| &self.all[i]).collect()
    }

    pub fn current_page(&self) -> Vec<&User> {
        self.visible
            .iter()
            .skip((self.page - 1) * self.page_size)
            .take(self.page_size)
            .map(|&i| &self.all[i])
            .collect()
    }

    pub fn pager(&self) -> String {
        format!("Page {} / {}", self.page, self.page_count())
    }

    fn refresh(&mut self) {
        let needle = self.search.as_str();
        let matching = self
            .all
            .iter()
            .enumerate()
            .filter(|(_, u)| needle.is_empty() || u.search_haystack().contains(needle))
            .map(|(i, _)| i);
        self.visible = match self.sort {
            Some((key, direction)) => {
                let all = &self.all;
                matching
                    .sorted_by(|&a, &b| {
                        let ord = compare_values(key.value(&all[a]), key.value(&all[b]));
                        match direction {
                            SortDirection::Asc => ord,
                            SortDirection::Desc => ord.reverse(),
                        }
                    })
                    .collect()
            }
            None => matching.collect(),
        };
        self.page = utils::clamp_page(self.page, self.visible.len(), self.page_size);
    }

    fn header(&self, key: SortKey) -> String {
        match self.sort {
            Some((current, direction)) if current == key => {
                format!("{} {}", key.label(), direction.arrow())
            }
            _ => key.label().to_string(),
        }
    }

    pub fn render(&self, format: OutputFormat) -> String {
        if format == OutputFormat::Json {
            return output::render_json(&self.current_page());
        }
        let placeholder = if !self.loaded {
            "Loading..."
        } else if self.all.is_empty() {
            "No users"
        } else {
            "No matching users"
        };
        let mut table = Table::new(SortKey::ALL.iter().map(|k| self.header(*k)))
            .placeholder(placeholder);
        for u in self.current_page() {
            table.push_row([
                u.user_id.clone(),
                u.name.clone(),
                u.email.clone().unwrap_or_default(),
                u.proxy.clone().unwrap_or_default(),
                u.salary.clone().unwrap_or_default(),
            ]);
        }
        let mut out = table.render();
        out.push_str(&format!(
            "{}  ({} of {} users)\n",
            self.pager(),
            self.filtered_len(),
            self.total_len()
        ));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: u32, name: &str, email: Option<&str>, proxy: Option<&str>) -> User {
        User {
            user_id: id.to_string(),
            name: name.to_string(),
            email: email.map(str::to_string),
            proxy: proxy.map(str::to_string),
            ..Default::default()
        }
    }

    fn numbered(n: u32) -> Vec<User> {
        (1..=n).map(|i| user(i, &format!("user{i}"), None, None)).collect()
    }

    fn names(users: &[&User]) -> Vec<String> {
        users.iter().map(|u| u.name.clone()).collect()
    }

    #[test]
    fn thirteen_users_span_two_pages() {
        let mut view = UsersView::default();
        view.set_users(numbered(13));
        assert_eq!(view.current_page().len(), 12);
        assert_eq!(view.pager(), "Page 1 / 2");
        assert!(view.next_page());
        assert_eq!(view.current_page().len(), 1);
        assert_eq!(view.pager(), "Page 2 / 2");
        assert!(!view.next_page());
    }

    #[test]
    fn search_is_case_insensitive_across_fields() {
        let mut view = UsersView::default();
        view.set_users(vec![
            user(1, "Ada Lovelace", Some("ada@example.com"), None),
            user(2, "Linus", None, Some("LT-77")),
            user(31, "Grace", Some("grace@navy.mil"), None),
        ]);
        view.set_search("ADA");
        assert_eq!(names(&view.filtered()), vec!["Ada Lovelace"]);
        view.set_search("lt-7");
        assert_eq!(names(&view.filtered()), vec!["Linus"]);
        view.set_search("NAVY");
        assert_eq!(names(&view.filtered()), vec!["Grace"]);
        view.set_search("3");
        assert_eq!(names(&view.filtered()), vec!["Grace"]);
        view.set_search("  ");
        assert_eq!(view.filtered_len(), 3);
    }

    #[test]
    fn same_column_toggles_new_column_resets() {
        let mut view = UsersView::default();
        view.set_users(vec![
            user(2, "bob", None, None),
            user(10, "alice", None, None),
            user(1, "Carol", None, None),
        ]);
        view.sort_by(SortKey::Name);
        assert_eq!(names(&view.filtered()), vec!["alice", "bob", "Carol"]);
        view.sort_by(SortKey::Name);
        assert_eq!(view.sort(), Some((SortKey::Name, SortDirection::Desc)));
        assert_eq!(names(&view.filtered()), vec!["Carol", "bob", "alice"]);
        view.sort_by(SortKey::Id);
        assert_eq!(view.sort(), Some((SortKey::Id, SortDirection::Asc)));
        assert_eq!(names(&view.filtered()), vec!["Carol", "bob", "alice"]);
        view.sort_by(SortKey::Id);
        assert_eq!(names(&view.filtered()), vec!["alice", "bob", "Carol"]);
    }

    #[test]
    fn sort_is_stable_and_puts_missing_values_first() {
        let mut view = UsersView::default();
        view.set_users(vec![
            user(1, "a", Some("x@example.com"), None),
            user(2, "b", None, None),
            user(3, "c", Some("x@example.com"), None),
            user(4, "d", None, None),
        ]);
        view.sort_by(SortKey::Email);
        assert_eq!(names(&view.filtered()), vec!["b", "d", "a", "c"]);
    }

    #[test]
    fn mixed_salaries_reverse_exactly() {
        let salaries = ["9000", "12,000", "10000", "NaN", "", "abc"];
        let users = salaries
            .iter()
            .enumerate()
            .map(|(i, salary)| User {
                user_id: i.to_string(),
                name: format!("u{i}"),
                salary: Some(salary.to_string()),
                ..Default::default()
            })
            .collect();
        let mut view = UsersView::default();
        view.set_users(users);
        let salary_of = |view: &UsersView| -> Vec<String> {
            view.filtered()
                .iter()
                .map(|u| u.salary.clone().unwrap_or_default())
                .collect()
        };

        view.sort_by(SortKey::Salary);
        let asc = salary_of(&view);
        assert_eq!(asc, vec!["", "9000", "10000", "12,000", "abc", "NaN"]);

        view.sort_by(SortKey::Salary);
        let mut reversed = asc.clone();
        reversed.reverse();
        assert_eq!(salary_of(&view), reversed);
    }

    #[test]
    fn page_is_clamped_after_search() {
        let mut view = UsersView::default();
        view.set_users(numbered(30));
        view.set_page(3);
        assert_eq!(view.page(), 3);
        view.set_search("user1");
        // user1, user10..user19
        assert_eq!(view.filtered_len(), 11);
        assert_eq!(view.page(), 1);
        view.set_search("nobody");
        assert_eq!(view.page(), 1);
        assert_eq!(view.pager(), "Page 1 / 1");
        assert!(view.current_page().is_empty());
    }

    #[test]
    fn set_page_clamps_both_ends() {
        let mut view = UsersView::default();
        view.set_users(numbered(25));
        view.set_page(0);
        assert_eq!(view.page(), 1);
        view.set_page(99);
        assert_eq!(view.page(), 3);
        assert!(!view.next_page());
        assert!(view.prev_page());
        assert_eq!(view.page(), 2);
    }

    #[test]
    fn render_marks_active_sort_column() {
        colored::control::set_override(false);
        let mut view = UsersView::default();
        view.set_users(numbered(2));
        view.sort_by(SortKey::Name);
        view.sort_by(SortKey::Name);
        let rendered = view.render(OutputFormat::Text);
        assert!(rendered.contains("Name v"));
        assert!(rendered.contains("Page 1 / 1  (2 of 2 users)"));
    }
}
