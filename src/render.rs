//! Text and JSON rendering of a family forest

use chrono::{Datelike, Local, NaiveDate};
use generational_arena::Index;
use serde::Serialize;
use termtree::Tree;
use tracing::instrument;

use crate::application::{ApplicationError, ApplicationResult};
use crate::config::Settings;
use crate::domain::{FamilyForest, FamilyNode, Member};

const ROSTER_DATE_FORMAT: &str = "%Y-%m-%d";

/// How member labels are rendered.
#[derive(Debug, Clone)]
pub struct LabelOptions {
    pub show_dates: bool,
    pub date_format: String,
    /// Reference date for the age of living members
    pub today: NaiveDate,
}

impl LabelOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            show_dates: settings.show_dates,
            date_format: settings.date_format.clone(),
            today: Local::now().date_naive(),
        }
    }
}

impl Default for LabelOptions {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

/// Full years between `birth` and `on`.
pub fn age_on(birth: NaiveDate, on: NaiveDate) -> Option<i32> {
    if on < birth {
        return None;
    }
    let mut age = on.year() - birth.year();
    if (on.month(), on.day()) < (birth.month(), birth.day()) {
        age -= 1;
    }
    Some(age)
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), ROSTER_DATE_FORMAT).ok()
}

fn format_date(raw: &str, format: &str) -> String {
    parse_date(raw)
        .map(|d| d.format(format).to_string())
        .unwrap_or_else(|| raw.to_string())
}

/// `Bob Smith (Jones) *1950-01-02 †2001-03-04 (51)`
pub fn member_label(member: &Member, opts: &LabelOptions) -> String {
    decorate(member.to_string(), member, opts)
}

/// Like [`member_label`], but with the full legal name (`First Middle Last`).
pub fn roster_label(member: &Member, opts: &LabelOptions) -> String {
    decorate(member.full_name(), member, opts)
}

/// Append maiden name, life dates and age to `label`.
fn decorate(mut label: String, member: &Member, opts: &LabelOptions) -> String {
    if let Some(maiden) = member.maiden_middle_name.as_deref().filter(|m| !m.is_empty()) {
        label.push_str(&format!(" ({maiden})"));
    }
    if !opts.show_dates {
        return label;
    }

    let birth = member.birthdate.as_deref().filter(|d| !d.is_empty());
    let death = member.deathdate.as_deref().filter(|d| !d.is_empty());
    if let Some(birth) = birth {
        label.push_str(&format!(" *{}", format_date(birth, &opts.date_format)));
    }
    if let Some(death) = death {
        label.push_str(&format!(" †{}", format_date(death, &opts.date_format)));
    }
    let end = match death {
        Some(death) => parse_date(death),
        None => Some(opts.today),
    };
    if let Some(age) = birth
        .and_then(parse_date)
        .zip(end)
        .and_then(|(b, e)| age_on(b, e))
    {
        label.push_str(&format!(" ({age})"));
    }
    label
}

pub fn couple_label(node: &FamilyNode, opts: &LabelOptions) -> String {
    match node.spouse_member() {
        Some(spouse) => format!(
            "{} ⚭ {}",
            member_label(&node.member, opts),
            member_label(spouse, opts)
        ),
        None => member_label(&node.member, opts),
    }
}

pub trait TreeNodeConvert {
    fn to_tree_string(&self, opts: &LabelOptions) -> Tree<String>;
}

impl TreeNodeConvert for FamilyForest {
    /// One tree per root; several roots hang under a synthetic "Family" node.
    fn to_tree_string(&self, opts: &LabelOptions) -> Tree<String> {
        match self.roots() {
            [] => Tree::new("Empty family".to_string()),
            [root] => subtree_string(self, *root, opts),
            roots => Tree::new("Family".to_string()).with_leaves(
                roots
                    .iter()
                    .map(|&root| subtree_string(self, root, opts))
                    .collect::<Vec<_>>(),
            ),
        }
    }
}

/// Tree for the couple at `idx` and everything below it.
#[instrument(level = "trace", skip(forest, opts))]
pub fn subtree_string(forest: &FamilyForest, idx: Index, opts: &LabelOptions) -> Tree<String> {
    fn build_tree(
        forest: &FamilyForest,
        node_idx: Index,
        parent_tree: &mut Tree<String>,
        opts: &LabelOptions,
    ) {
        if let Some(node) = forest.get_node(node_idx) {
            for &child_idx in &node.children {
                if let Some(child) = forest.get_node(child_idx) {
                    let mut child_tree = Tree::new(couple_label(child, opts));
                    build_tree(forest, child_idx, &mut child_tree, opts);
                    parent_tree.push(child_tree);
                }
            }
        }
    }

    match forest.get_node(idx) {
        Some(node) => {
            let mut tree = Tree::new(couple_label(node, opts));
            build_tree(forest, idx, &mut tree, opts);
            tree
        }
        None => Tree::new("Empty family".to_string()),
    }
}

/// Nested, serializable projection of a couple.
#[derive(Debug, Serialize)]
pub struct FamilyView<'a> {
    #[serde(flatten)]
    pub member: &'a Member,
    pub spouse: Option<&'a Member>,
    pub children: Vec<FamilyView<'a>>,
}

impl<'a> FamilyView<'a> {
    pub fn new(forest: &'a FamilyForest, idx: Index) -> Option<Self> {
        let node = forest.get_node(idx)?;
        Some(Self {
            member: &node.member,
            spouse: node.spouse_member(),
            children: node
                .children
                .iter()
                .filter_map(|&child| FamilyView::new(forest, child))
                .collect(),
        })
    }
}

/// Pretty JSON for the given roots.
pub fn to_json(forest: &FamilyForest, roots: &[Index]) -> ApplicationResult<String> {
    let views: Vec<FamilyView<'_>> = roots
        .iter()
        .filter_map(|&root| FamilyView::new(forest, root))
        .collect();
    serde_json::to_string_pretty(&views).map_err(|e| ApplicationError::OperationFailed {
        context: "serialize family tree".into(),
        source: Box::new(e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::build_forest;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn opts() -> LabelOptions {
        LabelOptions {
            show_dates: true,
            date_format: "%d.%m.%Y".into(),
            today: date(2020, 6, 15),
        }
    }

    #[test]
    fn given_birthday_not_yet_reached_when_computing_age_then_subtracts_one() {
        assert_eq!(age_on(date(1950, 6, 16), date(2020, 6, 15)), Some(69));
        assert_eq!(age_on(date(1950, 6, 15), date(2020, 6, 15)), Some(70));
        assert_eq!(age_on(date(2021, 1, 1), date(2020, 6, 15)), None);
    }

    #[test]
    fn given_deceased_member_when_labelling_then_age_at_death() {
        let mut member = Member::new("a", "Ann", "Doe");
        member.maiden_middle_name = Some("Roe".into());
        member.birthdate = Some("1900-01-02".into());
        member.deathdate = Some("1950-01-01".into());

        assert_eq!(
            member_label(&member, &opts()),
            "Ann Doe (Roe) *02.01.1900 †01.01.1950 (49)"
        );
    }

    #[test]
    fn given_middle_and_nick_name_when_roster_label_then_full_name_is_used() {
        let mut member = Member::new("a", "Robert", "Doe");
        member.middle_name = Some("James".into());
        member.nick_name = Some("Bob".into());
        member.birthdate = Some("2000-06-15".into());

        assert_eq!(member_label(&member, &opts()), "Bob Doe *15.06.2000 (20)");
        assert_eq!(
            roster_label(&member, &opts()),
            "Robert James Doe *15.06.2000 (20)"
        );
    }

    #[test]
    fn given_unparseable_date_when_labelling_then_kept_verbatim() {
        let mut member = Member::new("a", "Ann", "Doe");
        member.birthdate = Some("circa 1900".into());

        assert_eq!(member_label(&member, &opts()), "Ann Doe *circa 1900");
    }

    #[test]
    fn given_couple_with_child_when_rendering_then_tree_shows_both() {
        let members = vec![
            Member::new("a", "Ann", "Doe").with_spouse("b"),
            Member::new("b", "Bob", "Doe").with_spouse("a"),
            Member::new("c", "Cid", "Doe").with_parent("a"),
        ];
        let forest = build_forest(&members);
        let opts = LabelOptions {
            show_dates: false,
            ..opts()
        };

        let text = forest.to_tree_string(&opts).to_string();

        assert!(text.starts_with("Ann Doe ⚭ Bob Doe"), "{text}");
        assert!(text.contains("Cid Doe"), "{text}");
    }

    #[test]
    fn given_forest_when_serializing_then_nests_children() {
        let members = vec![
            Member::new("a", "Ann", "Doe"),
            Member::new("c", "Cid", "Doe").with_parent("a"),
        ];
        let forest = build_forest(&members);

        let json = to_json(&forest, forest.roots()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value[0]["id"], "a");
        assert!(value[0]["spouse"].is_null());
        assert_eq!(value[0]["children"][0]["id"], "c");
    }
}
