//! taskmate category commands

use serde::Serialize;

use crate::category::Category;
use crate::cli::Context;
use crate::error::Result;
use crate::ops::Outcome;
use crate::output::{emit_success, HumanOutput};

#[derive(Serialize)]
struct CategoryListReport<'a> {
    categories: &'a [Category],
    fallback_color: &'a str,
}

pub fn run_add(ctx: &mut Context, key: &str, color: Option<&str>) -> Result<()> {
    let outcome = ctx.session.add_category(key, color)?;

    let mut human = HumanOutput::new(format!("taskmate category add: {}", outcome.message()));
    if let Outcome::CategoryAdded { category } = &outcome {
        human.push_summary("key", category.key.clone());
        human.push_summary("color", category.color.clone());
        human.push_next_step(format!("taskmate list --category {}", category.key));
        human.push_next_step(format!("taskmate add \"<title>\" --category {}", category.key));
    }
    emit_success(ctx.output, "category add", &outcome, &human)
}

pub fn run_list(ctx: &Context) -> Result<()> {
    let categories = ctx.session.categories();
    let report = CategoryListReport {
        categories,
        fallback_color: ctx.session.ops().fallback_color(),
    };

    let mut human = HumanOutput::new(match categories.len() {
        0 => "taskmate category list: no categories".to_string(),
        1 => "taskmate category list: 1 category".to_string(),
        n => format!("taskmate category list: {n} categories"),
    });
    for category in categories {
        human.push_detail(format!("{} {}", category.key, category.color));
    }
    if categories.is_empty() {
        human.push_next_step("taskmate category add <key>");
    }
    emit_success(ctx.output, "category list", &report, &human)
}
