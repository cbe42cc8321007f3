//! Ordering and paging of the project list shown on the dashboard.

use std::cmp::Ordering;

use chrono::NaiveDate;

use crate::models::ProjectWithCompany;

pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Running projects first, ended ones last. Inside each group the latest end
/// date comes first and projects without an end date trail.
pub fn sort_for_dashboard(projects: &mut [ProjectWithCompany], today: NaiveDate) {
    projects.sort_by(|a, b| compare_for_dashboard(a, b, today));
}

fn compare_for_dashboard(a: &ProjectWithCompany, b: &ProjectWithCompany, today: NaiveDate) -> Ordering {
    let a_ended = a.project.has_ended_on(today);
    let b_ended = b.project.has_ended_on(today);

    // Option orders None first, so reversing puts missing end dates last
    a_ended
        .cmp(&b_ended)
        .then_with(|| b.project.end_date.cmp(&a.project.end_date))
        .then_with(|| a.project.id.cmp(&b.project.id))
}

/// Number of pages needed for `total` items. Zero items means zero pages.
pub fn page_count(total: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 0;
    }
    total.div_ceil(page_size)
}

/// The items on 1-based `page`. Out-of-range pages are empty.
pub fn page_slice<T>(items: &[T], page: usize, page_size: usize) -> &[T] {
    if page == 0 || page_size == 0 {
        return &[];
    }
    let start = (page - 1).saturating_mul(page_size);
    if start >= items.len() {
        return &[];
    }
    let end = start.saturating_add(page_size).min(items.len());
    &items[start..end]
}

/// One entry of the page strip under the project table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageLink {
    Page { number: usize, active: bool },
    Break,
}

/// Page strip for `total_pages` pages with `current` selected: the first two
/// pages, the last two, and the current page with its neighbours. Each gap
/// collapses into a single break.
pub fn page_links(total_pages: usize, current: usize) -> Vec<PageLink> {
    let mut links = Vec::new();
    let mut previous_shown = 0;

    for number in 1..=total_pages {
        let near_edge = number <= 2 || number + 2 > total_pages;
        let near_current = number + 1 >= current && number <= current + 1;
        if !(near_edge || near_current) {
            continue;
        }
        if number > previous_shown + 1 {
            links.push(PageLink::Break);
        }
        links.push(PageLink::Page {
            number,
            active: number == current,
        });
        previous_shown = number;
    }

    links
}

/// Dashboard paging state: which page is shown out of how many items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pager {
    pub page: usize,
    pub page_size: usize,
    pub total: usize,
}

impl Pager {
    pub fn new(total: usize, page_size: usize) -> Self {
        let page_size = if page_size == 0 { DEFAULT_PAGE_SIZE } else { page_size };
        Self {
            page: 1,
            page_size,
            total,
        }
    }

    pub fn total_pages(&self) -> usize {
        page_count(self.total, self.page_size)
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages()
    }

    pub fn next(&mut self) {
        if self.has_next() {
            self.page += 1;
        }
    }

    pub fn previous(&mut self) {
        if self.has_previous() {
            self.page -= 1;
        }
    }

    /// Jump to `page`, clamped to the available range.
    pub fn go_to(&mut self, page: usize) {
        self.page = page.clamp(1, self.total_pages().max(1));
    }

    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        page_slice(items, self.page, self.page_size)
    }

    pub fn links(&self) -> Vec<PageLink> {
        page_links(self.total_pages(), self.page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Company, Project};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn listed(id: i32, end_date: Option<NaiveDate>) -> ProjectWithCompany {
        let mut project = Project::new(1, format!("Project {}", id), 1, 1, 1);
        project.id = id;
        project.end_date = end_date;
        ProjectWithCompany {
            project,
            company: Company::new("Acme"),
        }
    }

    fn ids(projects: &[ProjectWithCompany]) -> Vec<i32> {
        projects.iter().map(|p| p.project.id).collect()
    }

    #[test]
    fn running_projects_come_before_ended_ones() {
        let today = date(2024, 6, 1);
        let mut projects = vec![
            listed(1, Some(date(2024, 1, 1))),
            listed(2, Some(date(2024, 12, 1))),
            listed(3, None),
        ];
        sort_for_dashboard(&mut projects, today);
        assert_eq!(ids(&projects), vec![2, 3, 1]);
    }

    #[test]
    fn later_end_dates_first_within_a_group() {
        let today = date(2024, 6, 1);
        let mut projects = vec![
            listed(1, Some(date(2023, 1, 1))),
            listed(2, Some(date(2024, 5, 1))),
            listed(3, Some(date(2024, 7, 1))),
            listed(4, Some(date(2025, 1, 1))),
            listed(5, Some(date(2024, 6, 1))),
        ];
        sort_for_dashboard(&mut projects, today);
        assert_eq!(ids(&projects), vec![4, 3, 5, 2, 1]);
    }

    #[test]
    fn projects_without_end_date_trail_the_running_group() {
        let today = date(2024, 6, 1);
        let mut projects = vec![listed(2, None), listed(1, None), listed(3, Some(date(2024, 8, 1)))];
        sort_for_dashboard(&mut projects, today);
        assert_eq!(ids(&projects), vec![3, 1, 2]);
    }

    #[test]
    fn page_count_rounds_up() {
        assert_eq!(page_count(0, 10), 0);
        assert_eq!(page_count(1, 10), 1);
        assert_eq!(page_count(10, 10), 1);
        assert_eq!(page_count(25, 10), 3);
    }

    #[test]
    fn page_slice_returns_the_requested_window() {
        let items: Vec<u32> = (1..=25).collect();
        assert_eq!(page_slice(&items, 1, 10).len(), 10);
        assert_eq!(page_slice(&items, 3, 10), &[21, 22, 23, 24, 25]);
        assert!(page_slice(&items, 4, 10).is_empty());
        assert!(page_slice(&items, 0, 10).is_empty());
    }

    #[test]
    fn short_strips_show_every_page() {
        let links = page_links(3, 2);
        assert_eq!(
            links,
            vec![
                PageLink::Page { number: 1, active: false },
                PageLink::Page { number: 2, active: true },
                PageLink::Page { number: 3, active: false },
            ]
        );
    }

    #[test]
    fn long_strips_break_around_the_current_page() {
        let links = page_links(10, 5);
        let rendered: Vec<String> = links
            .iter()
            .map(|link| match link {
                PageLink::Page { number, active: true } => format!("[{}]", number),
                PageLink::Page { number, .. } => number.to_string(),
                PageLink::Break => "...".to_string(),
            })
            .collect();
        assert_eq!(rendered, ["1", "2", "...", "4", "[5]", "6", "...", "9", "10"]);
    }

    #[test]
    fn no_break_when_the_current_page_touches_the_edge() {
        let links = page_links(8, 3);
        assert_eq!(links.iter().filter(|l| **l == PageLink::Break).count(), 1);
        assert_eq!(links[0], PageLink::Page { number: 1, active: false });
        assert_eq!(links[2], PageLink::Page { number: 3, active: true });
    }

    #[test]
    fn empty_list_has_no_links() {
        assert!(page_links(0, 1).is_empty());
    }

    #[test]
    fn pager_stays_within_bounds() {
        let mut pager = Pager::new(25, 10);
        assert_eq!(pager.total_pages(), 3);
        assert!(!pager.has_previous());

        pager.previous();
        assert_eq!(pager.page, 1);

        pager.next();
        pager.next();
        pager.next();
        assert_eq!(pager.page, 3);
        assert!(!pager.has_next());

        pager.go_to(99);
        assert_eq!(pager.page, 3);
        pager.go_to(0);
        assert_eq!(pager.page, 1);
    }

    #[test]
    fn pager_slices_ten_per_page_by_default() {
        let items: Vec<u32> = (1..=30).collect();
        let mut pager = Pager::new(items.len(), 0);
        assert_eq!(pager.page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(pager.slice(&items).len(), 10);
        pager.next();
        assert_eq!(pager.slice(&items)[0], 11);
    }
}
