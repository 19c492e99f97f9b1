//! HTML rendering for the web view.
//!
//! Pages are plain strings; every value taken from an entity is escaped.

use crate::error::StorageError;
use crate::models::{City, State};
use crate::storage::{self, Storage};

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

fn page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE HTML>\n<html lang=\"en\">\n  <head>\n    <title>HBNB</title>\n  </head>\n  <body>\n    <h1>{}</h1>\n{}  </body>\n</html>\n",
        escape_html(title),
        body
    )
}

fn state_item(state: &State) -> String {
    format!(
        "{}: <b>{}</b>",
        escape_html(&state.base.id),
        escape_html(&state.name)
    )
}

/// States sorted by name
pub fn sorted_states(storage: &dyn Storage) -> Result<Vec<State>, StorageError> {
    let mut states = storage::all::<State>(storage)?;
    states.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(states)
}

/// Every state with its cities, both sorted by name
pub fn states_with_cities(storage: &dyn Storage) -> Result<Vec<(State, Vec<City>)>, StorageError> {
    let cities = storage::all::<City>(storage)?;
    Ok(sorted_states(storage)?
        .into_iter()
        .map(|state| {
            let mut own: Vec<City> = cities
                .iter()
                .filter(|city| city.state_id == state.base.id)
                .cloned()
                .collect();
            own.sort_by(|a, b| a.name.cmp(&b.name));
            (state, own)
        })
        .collect())
}

pub fn render_states_list(states: &[State]) -> String {
    let mut body = String::from("    <ul>\n");
    for state in states {
        body.push_str(&format!("      <li>{}</li>\n", state_item(state)));
    }
    body.push_str("    </ul>\n");
    page("States", &body)
}

pub fn render_cities_by_states(groups: &[(State, Vec<City>)]) -> String {
    let mut body = String::from("    <ul>\n");
    for (state, cities) in groups {
        body.push_str(&format!("      <li>{}\n        <ul>\n", state_item(state)));
        for city in cities {
            body.push_str(&format!(
                "          <li>{}: <b>{}</b></li>\n",
                escape_html(&city.base.id),
                escape_html(&city.name)
            ));
        }
        body.push_str("        </ul>\n      </li>\n");
    }
    body.push_str("    </ul>\n");
    page("States", &body)
}
