//! Wikitext preview of write plans.
//!
//! One page section per plan: labels and aliases, descriptions, the matched
//! entity, the default reference and a table of the claims to add.

use std::{collections::BTreeSet, fmt::Write as _};

use wfd_core::{
  claim::{Reference, Snak, Statement, Value},
  entity::Target,
  plan::WritePlan,
  store::PreviewRenderer,
};

/// Renders plans as MediaWiki markup using the `{{Q}}`/`{{P}}` templates.
#[derive(Debug, Default, Clone, Copy)]
pub struct WikitextRenderer;

impl PreviewRenderer for WikitextRenderer {
  fn render(&self, unique_code: &str, plan: &WritePlan) -> String {
    let mut page = format!("== {unique_code} ==\n\n");

    section(&mut page, "Labels | Aliases", &labels(plan));
    section(&mut page, "Descriptions", &descriptions(plan));
    let matching = match plan.target {
      Target::Existing(id) => format!("{{{{Q|{id}}}}}"),
      Target::New => "–".to_string(),
    };
    let _ = write!(page, "{}: {matching}\n\n", bold("Matching item"));

    if let Some(reference) = &plan.reference {
      section(
        &mut page,
        "Default reference (same for all claims)",
        &format_reference(reference),
      );
    }
    section(
      &mut page,
      "Claims",
      &claims_table(&plan.statements, plan.reference.as_ref()),
    );
    if !plan.sourced.is_empty() {
      section(
        &mut page,
        "Existing claims to source",
        &claims_table(&plan.sourced, plan.reference.as_ref()),
      );
    }
    page
  }
}

fn section(page: &mut String, title: &str, body: &str) {
  let _ = write!(page, "{}:\n{body}\n\n", bold(title));
}

fn bold(text: &str) -> String { format!("'''{text}'''") }

fn italics(text: &str) -> String { format!("''{text}''") }

/// The preferred label in italics, followed by the aliases.
fn labels(plan: &WritePlan) -> String {
  let terms = &plan.terms;
  let languages: BTreeSet<&String> =
    terms.labels.keys().chain(terms.aliases.keys()).collect();

  let mut out = String::new();
  for language in languages {
    let mut names: Vec<String> = Vec::new();
    if let Some(label) = terms.labels.get(language) {
      names.push(italics(label));
    }
    if let Some(aliases) = terms.aliases.get(language) {
      names.extend(aliases.iter().cloned());
    }
    if !names.is_empty() {
      let _ = writeln!(out, "* {}: {}", bold(language), names.join(" | "));
    }
  }
  out
}

fn descriptions(plan: &WritePlan) -> String {
  let mut out = String::new();
  for (language, description) in &plan.terms.descriptions {
    let _ = writeln!(out, "* {}: {description}", bold(language));
  }
  out
}

fn claims_table(statements: &[Statement], default: Option<&Reference>) -> String {
  let own_references = statements
    .iter()
    .any(|s| !s.references.is_empty() && s.references.first() != default);

  let mut table =
    String::from("{| class='wikitable'\n|-\n! Property\n! Value\n! Qualifiers\n");
  if own_references {
    table.push_str("! References\n");
  }

  let mut ordered: Vec<&Statement> = statements.iter().collect();
  ordered.sort_by_key(|s| s.property);
  for statement in ordered {
    let mut value = format_value(&statement.value);
    if statement.provisional {
      value.push(' ');
      value.push_str(&italics("provisional"));
    }
    let qualifiers = match statement.qualifiers.as_slice() {
      [] => String::new(),
      [one] => format_snak(one),
      many => many
        .iter()
        .map(|q| format!("* {}", format_snak(q)))
        .collect::<Vec<_>>()
        .join(" \n"),
    };
    let _ = write!(
      table,
      "|-\n| {{{{P|{}}}}} \n| {value} \n| {qualifiers} \n",
      statement.property
    );
    if own_references {
      let references = match statement.references.first() {
        Some(r) if Some(r) != default => format_reference(r),
        _ => italics("default reference"),
      };
      let _ = writeln!(table, "| {references} ");
    }
  }
  table.push_str("|}");
  table
}

fn format_reference(reference: &Reference) -> String {
  let mut out = String::new();
  if !reference.tested.is_empty() {
    let _ = writeln!(out, ":{}:", italics("tested"));
    for snak in &reference.tested {
      let _ = writeln!(out, ":*{}", format_snak(snak));
    }
  }
  if !reference.untested.is_empty() {
    let _ = writeln!(out, ":{}:", italics("not tested"));
    for snak in &reference.untested {
      let _ = writeln!(out, ":*{}", format_snak(snak));
    }
  }
  out
}

fn format_snak(snak: &Snak) -> String {
  format!("{{{{P|{}}}}}: {}", snak.property, format_value(&snak.value))
}

fn format_value(value: &Value) -> String {
  match value {
    Value::Item(id) => format!("{{{{Q|{id}}}}}"),
    Value::Text(text) => text.clone(),
    Value::Quantity { amount, unit: Some(unit) } => {
      format!("{amount} {{{{Q|{unit}}}}}")
    }
    Value::Quantity { amount, unit: None } => amount.clone(),
    Value::Year(year) => year.to_string(),
    Value::Date(day) => day.format("%Y-%m-%d").to_string(),
    Value::SomeValue => "{{Q'|some value}}".to_string(),
    Value::NoValue => "{{Q'|no value}}".to_string(),
  }
}

#[cfg(test)]
mod tests {
  use wfd_core::{entity::EntityId, vocab};

  use super::*;

  fn reference() -> Reference {
    Reference {
      tested:   vec![Snak::new(vocab::STATED_IN, EntityId::new(27074437))],
      untested: vec![Snak::new(
        vocab::RETRIEVED,
        Value::Date(chrono::NaiveDate::from_ymd_opt(2017, 6, 1).unwrap()),
      )],
    }
  }

  fn plan(target: Target) -> WritePlan {
    let mut plan = WritePlan::new(target);
    plan.terms.labels.insert("en".into(), "Bothnian Sea".into());
    plan.terms.add_alias("en", "SE5101");
    plan.terms.descriptions.insert("sv".into(), "avrinningsdistrikt i Sverige".into());
    plan.reference = Some(reference());
    let mut impact = Statement::new(vocab::SIGNIFICANT_IMPACT, Value::NoValue)
      .with_qualifier(Snak::new(vocab::POINT_IN_TIME, Value::Year(2016)))
      .with_reference(reference());
    impact.provisional = true;
    plan.statements = vec![
      impact,
      Statement::new(vocab::INSTANCE_OF, vocab::RIVER_BASIN_DISTRICT)
        .with_reference(reference()),
    ];
    plan
  }

  #[test]
  fn page_lists_terms_and_target() {
    let page = WikitextRenderer.render("SE5101", &plan(Target::New));
    assert!(page.starts_with("== SE5101 ==\n"));
    assert!(page.contains("* '''en''': ''Bothnian Sea'' | SE5101\n"));
    assert!(page.contains("* '''sv''': avrinningsdistrikt i Sverige\n"));
    assert!(page.contains("'''Matching item''': –\n"));

    let page =
      WikitextRenderer.render("SE5101", &plan(Target::Existing(EntityId::new(42))));
    assert!(page.contains("'''Matching item''': {{Q|Q42}}\n"));
  }

  #[test]
  fn claims_are_sorted_and_special_values_use_the_template() {
    let page = WikitextRenderer.render("SE5101", &plan(Target::New));
    let class = page.find("{{P|P31}}").unwrap();
    let impact = page.find("{{P|P3643}}").unwrap();
    assert!(class < impact);
    assert!(page.contains("| {{Q'|no value}} ''provisional'' \n"));
    assert!(page.contains("| {{P|P585}}: 2016 \n"));
    assert!(!page.contains("! References"));
  }

  #[test]
  fn reference_is_split_into_tested_and_not_tested() {
    let page = WikitextRenderer.render("SE5101", &plan(Target::New));
    assert!(page.contains(":''tested'':\n:*{{P|P248}}: {{Q|Q27074437}}\n"));
    assert!(page.contains(":''not tested'':\n:*{{P|P813}}: 2017-06-01\n"));
  }

  #[test]
  fn quantities_show_their_unit() {
    let value = Value::Quantity {
      amount: "990".into(),
      unit:   Some(vocab::SQUARE_KILOMETRE),
    };
    assert_eq!(format_value(&value), "990 {{Q|Q712226}}");
  }
}
