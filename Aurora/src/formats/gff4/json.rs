//! JSON rendering of GFF4 structs, used by `aurora gff dump`

use super::structs::Gff4Struct;
use super::types::{FieldType, ValueClass};
use crate::error::Result;
use crate::language::LanguageConfig;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use glam::{Vec3, Vec4};
use serde_json::{Map, Value, json};

impl Gff4Struct<'_> {
    /// Render this struct and everything reachable from it.
    ///
    /// Each object carries its struct type in `"$id"`. A struct already on
    /// the current path is rendered as `{"$ref": index}` instead of recursing.
    pub fn to_json(&self, languages: &LanguageConfig) -> Result<Value> {
        let mut path = Vec::new();
        self.render(languages, &mut path)
    }

    fn render(&self, languages: &LanguageConfig, path: &mut Vec<usize>) -> Result<Value> {
        if path.contains(&self.index()) {
            return Ok(json!({ "$ref": self.index() }));
        }
        path.push(self.index());

        let mut object = Map::new();
        object.insert("$id".to_string(), json!(self.id()));

        for label in self.labels()? {
            let Some(field_type) = self.field_type(label)? else {
                continue;
            };

            let value = match field_type.class() {
                ValueClass::Unsigned(_) => json!(self.get_uint(label, 0)?),
                ValueClass::Signed(_) => json!(self.get_sint(label, 0)?),
                ValueClass::Float(_) => json!(self.get_double(label, 0.0)?),
                ValueClass::Text => json!(self.get_string(label, "")?),
                ValueClass::Blob => {
                    let bytes = self.get_data(label)?.unwrap_or_default();
                    json!(STANDARD.encode(bytes))
                }
                ValueClass::Vector => json!(self.get_vector(label, Vec3::ZERO)?.to_array()),
                ValueClass::Orientation => json!(self.get_orientation(label, Vec4::ZERO)?.to_array()),
                ValueClass::LocString => match self.get_loc_string(label, languages)? {
                    Some(loc) => {
                        let strings: Map<String, Value> =
                            loc.strings().map(|(id, text)| (id.to_string(), json!(text))).collect();
                        json!({ "strref": loc.id(), "strings": strings })
                    }
                    None => Value::Null,
                },
                ValueClass::Struct => self.get_struct(label)?.render(languages, path)?,
                ValueClass::List => {
                    let list = self.get_list(label)?;
                    let mut items = Vec::with_capacity(list.len());
                    for item in list.iter() {
                        items.push(item.render(languages, path)?);
                    }
                    Value::Array(items)
                }
            };

            // Keep the strref distinguishable from a plain uint32
            let value = if field_type == FieldType::StrRef {
                json!({ "strref": value })
            } else {
                value
            };
            object.insert(label.to_string(), value);
        }

        path.pop();
        Ok(Value::Object(object))
    }
}

#[cfg(test)]
mod tests {
    use crate::formats::gff4::{Gff4File, Gff4WriteStruct, Gff4WriteValue as V, Gff4Writer};
    use crate::language::LanguageConfig;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_dump_tree() {
        let top = Gff4WriteStruct::new(4)
            .with("Name", V::String("chest".into()))
            .with("Blob", V::Void(b"abc".to_vec()))
            .with("Pos", V::Vector([1.0, 2.0, 3.0]))
            .with("Text", V::StrRef(7))
            .with(
                "Desc",
                V::LocString {
                    str_ref: 12,
                    strings: vec![(0, "Hello".into())],
                },
            )
            .with("Items", V::List(vec![Gff4WriteStruct::new(5).with("N", V::Sint32(-1))]));
        let data = Gff4Writer::new(*b"TEST", *b"V1.0").write(&top).unwrap();
        let gff = Gff4File::load(data, *b"TEST").unwrap();

        let value = gff.top_level().to_json(&LanguageConfig::aurora_default()).unwrap();
        assert_eq!(
            value,
            json!({
                "$id": 4,
                "Name": "chest",
                "Blob": "YWJj",
                "Pos": [1.0, 2.0, 3.0],
                "Text": { "strref": 7 },
                "Desc": { "strref": 12, "strings": { "0": "Hello" } },
                "Items": [{ "$id": 5, "N": -1 }],
            })
        );
    }
}
