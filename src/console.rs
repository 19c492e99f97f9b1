// 💻 Command console - line-oriented CRUD over a storage handle
//
// Commands:
//   create <Class> [key=value ...]     show <Class> <id>
//   destroy <Class> <id>               all [Class]
//   count <Class>                      update <Class> <id> <attr> <value>
//   <Class>.all()  <Class>.count()  <Class>.show(<id>)  <Class>.destroy(<id>)

use serde_json::Value;

use crate::error::StorageError;
use crate::models::{FieldMap, Model, ModelKind, CLASS_FIELD};
use crate::storage::Storage;

pub const PROMPT: &str = "(hbnb) ";

const CLASS_MISSING: &str = "** class name missing **";
const CLASS_UNKNOWN: &str = "** class doesn't exist **";
const ID_MISSING: &str = "** instance id missing **";
const NOT_FOUND: &str = "** no instance found **";
const ATTRIBUTE_MISSING: &str = "** attribute name missing **";
const VALUE_MISSING: &str = "** value missing **";

/// Fields the console never overwrites
const PROTECTED: [&str; 4] = ["id", "created_at", "updated_at", CLASS_FIELD];

const HELP: &str = "Documented commands:
  create <Class> [key=value ...]
  show <Class> <id>
  destroy <Class> <id>
  all [Class]
  count <Class>
  update <Class> <id> <attribute> <value>
  <Class>.all() | <Class>.count() | <Class>.show(<id>) | <Class>.destroy(<id>)
  quit";

pub struct Console<'a> {
    storage: &'a mut dyn Storage,
}

impl<'a> Console<'a> {
    pub fn new(storage: &'a mut dyn Storage) -> Self {
        Console { storage }
    }

    /// Run one command line; `Ok(None)` means nothing to print
    pub fn execute(&mut self, line: &str) -> Result<Option<String>, StorageError> {
        let line = rewrite_dotted(line.trim()).unwrap_or_else(|| line.trim().to_string());
        let args = split_args(&line);
        let Some((command, rest)) = args.split_first() else {
            return Ok(None);
        };

        match command.as_str() {
            "create" => self.create(rest),
            "show" => self.show(rest),
            "destroy" => self.destroy(rest),
            "all" => self.all(rest),
            "count" => self.count(rest),
            "update" => self.update(rest),
            "help" => Ok(Some(HELP.to_string())),
            _ => Ok(Some(format!("*** Unknown syntax: {}", line))),
        }
    }

    fn create(&mut self, args: &[String]) -> Result<Option<String>, StorageError> {
        let kind = match parse_kind(args.first()) {
            Ok(kind) => kind,
            Err(message) => return Ok(Some(message.to_string())),
        };

        let mut model = Model::new(kind);
        let params: Vec<(String, Value)> = args[1..]
            .iter()
            .filter_map(|arg| parse_param(arg))
            .filter(|(key, _)| !PROTECTED.contains(&key.as_str()))
            .collect();

        if !params.is_empty() {
            let mut dict = model.to_dict();
            dict.extend(params);
            model = match Model::from_dict(kind, dict) {
                Ok(model) => model,
                Err(e) => return Ok(Some(format!("** invalid parameter: {} **", e))),
            };
        }

        model.save(self.storage)?;
        Ok(Some(model.id().to_string()))
    }

    /// Resolve `<Class> <id>` to a stored model, or the message explaining why not
    fn lookup(&self, args: &[String]) -> Result<Result<Model, &'static str>, StorageError> {
        let kind = match parse_kind(args.first()) {
            Ok(kind) => kind,
            Err(message) => return Ok(Err(message)),
        };
        let Some(id) = args.get(1) else {
            return Ok(Err(ID_MISSING));
        };
        Ok(self.storage.get(kind, id)?.ok_or(NOT_FOUND))
    }

    fn show(&mut self, args: &[String]) -> Result<Option<String>, StorageError> {
        Ok(Some(match self.lookup(args)? {
            Ok(model) => model.to_string(),
            Err(message) => message.to_string(),
        }))
    }

    fn destroy(&mut self, args: &[String]) -> Result<Option<String>, StorageError> {
        match self.lookup(args)? {
            Ok(model) => {
                model.delete(self.storage)?;
                Ok(None)
            }
            Err(message) => Ok(Some(message.to_string())),
        }
    }

    fn all(&mut self, args: &[String]) -> Result<Option<String>, StorageError> {
        let kind = match args.first() {
            None => None,
            Some(_) => match parse_kind(args.first()) {
                Ok(kind) => Some(kind),
                Err(message) => return Ok(Some(message.to_string())),
            },
        };

        let lines: Vec<String> = self
            .storage
            .query(kind)?
            .values()
            .map(Model::to_string)
            .collect();
        if lines.is_empty() {
            return Ok(Some("[]".to_string()));
        }
        Ok(Some(lines.join("\n")))
    }

    fn count(&mut self, args: &[String]) -> Result<Option<String>, StorageError> {
        match parse_kind(args.first()) {
            Ok(kind) => Ok(Some(self.storage.count(Some(kind))?.to_string())),
            Err(message) => Ok(Some(message.to_string())),
        }
    }

    fn update(&mut self, args: &[String]) -> Result<Option<String>, StorageError> {
        let model = match self.lookup(args)? {
            Ok(model) => model,
            Err(message) => return Ok(Some(message.to_string())),
        };
        let Some(attribute) = args.get(2) else {
            return Ok(Some(ATTRIBUTE_MISSING.to_string()));
        };
        let Some(raw) = args.get(3) else {
            return Ok(Some(VALUE_MISSING.to_string()));
        };
        if PROTECTED.contains(&attribute.as_str()) {
            return Ok(None);
        }

        let mut dict: FieldMap = model.to_dict();
        let value = match dict.get(attribute.as_str()) {
            None => return Ok(Some(format!("** unknown attribute: {} **", attribute))),
            Some(current) => match coerce(current, &unquote(raw)) {
                Some(value) => value,
                None => return Ok(Some(format!("** invalid value for {} **", attribute))),
            },
        };
        dict.insert(attribute.clone(), value);

        let mut updated = match Model::from_dict(model.kind(), dict) {
            Ok(updated) => updated,
            Err(e) => return Ok(Some(format!("** invalid value: {} **", e))),
        };
        updated.save(self.storage)?;
        Ok(None)
    }
}

fn parse_kind(arg: Option<&String>) -> Result<ModelKind, &'static str> {
    match arg {
        None => Err(CLASS_MISSING),
        Some(name) => name.parse().map_err(|_| CLASS_UNKNOWN),
    }
}

/// `State.show("id")` becomes `show State id`
fn rewrite_dotted(line: &str) -> Option<String> {
    let (class, call) = line.split_once('.')?;
    let (method, rest) = call.split_once('(')?;
    let arg = rest.strip_suffix(')')?.trim().trim_matches('"');
    if class.contains(char::is_whitespace) || method.is_empty() {
        return None;
    }
    Some(format!("{} {} {}", method, class, arg).trim().to_string())
}

/// Split on whitespace, keeping double-quoted runs (and their quotes) together
pub fn split_args(line: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut escaped = false;

    for c in line.chars() {
        if escaped {
            current.push(c);
            escaped = false;
            continue;
        }
        match c {
            '\\' if in_quotes => {
                current.push(c);
                escaped = true;
            }
            '"' => {
                current.push(c);
                in_quotes = !in_quotes;
            }
            c if c.is_whitespace() && !in_quotes => {
                if !current.is_empty() {
                    args.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        args.push(current);
    }
    args
}

fn unquote(raw: &str) -> String {
    match raw.strip_prefix('"').and_then(|s| s.strip_suffix('"')) {
        Some(inner) => inner.replace("\\\"", "\""),
        None => raw.to_string(),
    }
}

/// `key="a_b"` is the string `a b`; `key=1.5` a float; `key=3` an integer.
/// Anything else is skipped.
pub fn parse_param(arg: &str) -> Option<(String, Value)> {
    let (key, raw) = arg.split_once('=')?;
    if key.is_empty() {
        return None;
    }

    let value = if raw.len() >= 2 && raw.starts_with('"') && raw.ends_with('"') {
        let inner = &raw[1..raw.len() - 1];
        Value::String(inner.replace('_', " ").replace("\\\"", "\""))
    } else if raw.contains('.') {
        Value::from(finite(raw)?)
    } else {
        Value::from(raw.parse::<i64>().ok()?)
    };
    Some((key.to_string(), value))
}

/// Convert console text to the JSON type the field already has
fn coerce(current: &Value, raw: &str) -> Option<Value> {
    match current {
        Value::String(_) => Some(Value::String(raw.to_string())),
        Value::Number(n) if n.is_i64() => raw.parse::<i64>().ok().map(Value::from),
        Value::Number(_) => finite(raw).map(Value::from),
        _ => None,
    }
}

// JSON has no inf or NaN
fn finite(raw: &str) -> Option<f64> {
    raw.parse::<f64>().ok().filter(|f| f.is_finite())
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::FileStorage;
    use serde_json::json;

    fn run(storage: &mut FileStorage, line: &str) -> String {
        Console::new(storage).execute(line).unwrap().unwrap_or_default()
    }

    #[test]
    fn test_split_args_keeps_quoted_runs() {
        assert_eq!(
            split_args(r#"update User 1 first_name "Betty Bar""#),
            vec!["update", "User", "1", "first_name", "\"Betty Bar\""]
        );
        assert_eq!(split_args("   "), Vec::<String>::new());
    }

    #[test]
    fn test_parse_param() {
        assert_eq!(
            parse_param(r#"name="My_little_house""#),
            Some(("name".to_string(), json!("My little house")))
        );
        assert_eq!(
            parse_param(r#"name="say_\"hi\"""#),
            Some(("name".to_string(), json!("say \"hi\"")))
        );
        assert_eq!(parse_param("latitude=37.77"), Some(("latitude".to_string(), json!(37.77))));
        assert_eq!(parse_param("number_rooms=4"), Some(("number_rooms".to_string(), json!(4))));
        assert_eq!(parse_param("number_rooms=four"), None);
        assert_eq!(parse_param("=4"), None);
        assert_eq!(parse_param("noequals"), None);
    }

    #[test]
    fn test_rewrite_dotted() {
        assert_eq!(rewrite_dotted("State.all()"), Some("all State".to_string()));
        assert_eq!(
            rewrite_dotted("City.show(\"abc\")"),
            Some("show City abc".to_string())
        );
        assert_eq!(rewrite_dotted("create State"), None);
    }

    #[test]
    fn test_error_messages() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = FileStorage::new(dir.path().join("file.json"));

        assert_eq!(run(&mut storage, "create"), CLASS_MISSING);
        assert_eq!(run(&mut storage, "create Planet"), CLASS_UNKNOWN);
        assert_eq!(run(&mut storage, "show State"), ID_MISSING);
        assert_eq!(run(&mut storage, "show State 123"), NOT_FOUND);
        assert_eq!(run(&mut storage, "destroy"), CLASS_MISSING);
        assert_eq!(run(&mut storage, "all Planet"), CLASS_UNKNOWN);
        assert_eq!(run(&mut storage, "count"), CLASS_MISSING);
        assert!(run(&mut storage, "fly State").starts_with("*** Unknown syntax"));
        assert_eq!(run(&mut storage, ""), "");
    }

    #[test]
    fn test_create_show_destroy() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = FileStorage::new(dir.path().join("file.json"));

        let id = run(&mut storage, r#"create State name="California""#);
        let shown = run(&mut storage, &format!("show State {}", id));
        assert!(shown.starts_with(&format!("[State] ({})", id)));
        assert!(shown.contains("California"));
        assert_eq!(run(&mut storage, "count State"), "1");
        assert_eq!(run(&mut storage, "State.count()"), "1");

        assert_eq!(run(&mut storage, &format!("State.destroy(\"{}\")", id)), "");
        assert_eq!(run(&mut storage, &format!("show State {}", id)), NOT_FOUND);
    }

    #[test]
    fn test_create_with_typed_params() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = FileStorage::new(dir.path().join("file.json"));

        let id = run(
            &mut storage,
            r#"create Place city_id="0001" name="My_little_house" number_rooms=4 latitude=37.77 bogus"#,
        );
        let place = storage.get(ModelKind::Place, &id).unwrap().unwrap();
        let dict = place.to_dict();

        assert_eq!(dict["name"], json!("My little house"));
        assert_eq!(dict["number_rooms"], json!(4));
        assert_eq!(dict["latitude"], json!(37.77));
    }

    #[test]
    fn test_create_rejects_unknown_attribute() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = FileStorage::new(dir.path().join("file.json"));

        let out = run(&mut storage, r#"create State motto="Eureka""#);
        assert!(out.starts_with("** invalid parameter"));
        assert_eq!(storage.count(None).unwrap(), 0);
    }

    #[test]
    fn test_update_coerces_to_field_type() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = FileStorage::new(dir.path().join("file.json"));
        let id = run(&mut storage, r#"create Place name="Hut""#);

        assert_eq!(run(&mut storage, &format!("update Place {} max_guest 8", id)), "");
        assert_eq!(
            run(&mut storage, &format!(r#"update Place {} name "Big Hut""#, id)),
            ""
        );
        assert_eq!(
            run(&mut storage, &format!("update Place {} max_guest many", id)),
            "** invalid value for max_guest **"
        );
        assert_eq!(run(&mut storage, &format!("update Place {}", id)), ATTRIBUTE_MISSING);
        assert_eq!(run(&mut storage, &format!("update Place {} name", id)), VALUE_MISSING);

        // Identity is not editable
        assert_eq!(run(&mut storage, &format!("update Place {} id other", id)), "");

        let dict = storage.get(ModelKind::Place, &id).unwrap().unwrap().to_dict();
        assert_eq!(dict["max_guest"], json!(8));
        assert_eq!(dict["name"], json!("Big Hut"));
        assert_eq!(dict["id"], json!(id));
    }

    #[test]
    fn test_all_lists_by_class() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = FileStorage::new(dir.path().join("file.json"));
        run(&mut storage, r#"create State name="Ohio""#);
        run(&mut storage, r#"create Amenity name="Wifi""#);

        assert_eq!(run(&mut storage, "all").lines().count(), 2);
        let states = run(&mut storage, "all State");
        assert_eq!(states.lines().count(), 1);
        assert!(states.starts_with("[State]"));
        assert_eq!(run(&mut storage, "Amenity.all()").lines().count(), 1);
        assert_eq!(run(&mut storage, "all Review"), "[]");
    }

    #[test]
    fn test_all_on_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = FileStorage::new(dir.path().join("file.json"));

        assert_eq!(run(&mut storage, "all"), "[]");
        assert_eq!(run(&mut storage, "State.all()"), "[]");
    }

    #[test]
    fn test_non_finite_numbers_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = FileStorage::new(dir.path().join("file.json"));
        let id = run(&mut storage, r#"create Place name="Hut" latitude=12.5"#);

        for raw in ["inf", "-inf", "NaN", "1.0e999"] {
            assert_eq!(
                run(&mut storage, &format!("update Place {} latitude {}", id, raw)),
                "** invalid value for latitude **"
            );
        }
        let dict = storage.get(ModelKind::Place, &id).unwrap().unwrap().to_dict();
        assert_eq!(dict["latitude"], json!(12.5));

        assert_eq!(parse_param("latitude=1.0e999"), None);
        assert_eq!(parse_param("latitude=inf"), None);
        assert_eq!(parse_param("latitude=NaN"), None);
    }
}
