//! Sansay XML response decoder
//!
//! Every resource returns one of three fixed document shapes. The shape is
//! chosen from the resource path, never sniffed from the content; a document
//! whose root does not match is rejected as a whole.

use quick_xml::events::Event;
use quick_xml::Reader;
use serde::Deserialize;

use crate::error::DecodeError;

/// Document shapes returned by the Sansay API
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseShape {
    /// Generic `mysqldump` table dump
    Tabular,
    /// `XBMediaServerRealTimeStatList`
    MediaServerList,
    /// `XBResourceList` configuration download
    ResourceConfigList,
}

impl ResponseShape {
    /// Shape expected for a resource path, by suffix
    pub fn for_path(path: &str) -> Self {
        if path.ends_with("media_server") {
            ResponseShape::MediaServerList
        } else if path.ends_with("download/resource") {
            ResponseShape::ResourceConfigList
        } else {
            ResponseShape::Tabular
        }
    }

    /// Expected document root element
    pub fn root_element(&self) -> &'static str {
        match self {
            ResponseShape::Tabular => "mysqldump",
            ResponseShape::MediaServerList => "XBMediaServerRealTimeStatList",
            ResponseShape::ResourceConfigList => "XBResourceList",
        }
    }
}

/// A decoded resource
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    /// Table dump (real-time and windowed statistics)
    Tabular(TabularDump),
    /// Media server status list
    MediaServers(Vec<MediaServerRecord>),
    /// Trunk group configuration list
    ResourceConfigs(Vec<ResourceConfigRecord>),
}

/// `<mysqldump>` document
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TabularDump {
    #[serde(default)]
    pub database: Database,
}

/// `<database name="...">`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Database {
    #[serde(rename = "@name", default)]
    pub name: String,
    #[serde(rename = "table", default)]
    pub tables: Vec<Table>,
}

/// `<table name="...">`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Table {
    #[serde(rename = "@name", default)]
    pub name: String,
    #[serde(rename = "row", default)]
    pub rows: Vec<Row>,
}

/// `<row>`: ordered fields
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Row {
    #[serde(rename = "field", default)]
    pub fields: Vec<Field>,
}

/// `<field name="...">value</field>`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Field {
    #[serde(rename = "@name", default)]
    pub name: String,
    #[serde(rename = "$text", default)]
    pub value: String,
}

impl Field {
    /// Convenience constructor, mostly for tests
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct MediaServerList {
    #[serde(rename = "XBMediaServerRealTimeStat", default)]
    servers: Vec<MediaServerRecord>,
}

/// One `XBMediaServerRealTimeStat` entry
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MediaServerRecord {
    #[serde(rename = "mediaSrvIndex", default)]
    pub index: String,
    #[serde(rename = "publicIP", default)]
    pub public_ip: String,
    #[serde(rename = "maxConnections", default)]
    pub max_connections: String,
    #[serde(default)]
    pub priority: String,
    #[serde(default)]
    pub alias: String,
    #[serde(rename = "switchType", default)]
    pub switch_type: String,
    #[serde(default)]
    pub status: String,
    #[serde(rename = "numActiveSessions", default)]
    pub active_sessions: String,
}

#[derive(Debug, Default, Deserialize)]
struct ResourceList {
    #[serde(rename = "XBResource", default)]
    resources: Vec<ResourceConfigRecord>,
}

/// One `XBResource` entry; the many routing fields are not used
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ResourceConfigRecord {
    #[serde(rename = "trunkId", default)]
    pub trunk_id: String,
    #[serde(rename = "name", default)]
    pub alias: String,
    #[serde(default)]
    pub capacity: String,
    #[serde(rename = "cpsLimit", default)]
    pub cps_limit: String,
}

/// Decode the body fetched from `path`
pub fn decode(path: &str, body: &[u8]) -> Result<Decoded, DecodeError> {
    let xml = std::str::from_utf8(body).map_err(|e| DecodeError::Xml {
        path: path.to_string(),
        message: format!("invalid UTF-8: {}", e),
    })?;

    let shape = ResponseShape::for_path(path);
    let root = root_element(path, xml)?;
    if root != shape.root_element() {
        return Err(DecodeError::UnexpectedRoot {
            path: path.to_string(),
            expected: shape.root_element(),
            found: root,
        });
    }

    let xml_error = |e: quick_xml::de::DeError| DecodeError::Xml {
        path: path.to_string(),
        message: e.to_string(),
    };

    let decoded = match shape {
        ResponseShape::Tabular => {
            Decoded::Tabular(quick_xml::de::from_str::<TabularDump>(xml).map_err(xml_error)?)
        }
        ResponseShape::MediaServerList => Decoded::MediaServers(
            quick_xml::de::from_str::<MediaServerList>(xml)
                .map_err(xml_error)?
                .servers,
        ),
        ResponseShape::ResourceConfigList => Decoded::ResourceConfigs(
            quick_xml::de::from_str::<ResourceList>(xml)
                .map_err(xml_error)?
                .resources,
        ),
    };

    Ok(decoded)
}

/// Local name of the first element in the document
fn root_element(path: &str, xml: &str) -> Result<String, DecodeError> {
    let mut reader = Reader::from_str(xml);

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                return Ok(String::from_utf8_lossy(e.local_name().as_ref()).into_owned());
            }
            Ok(Event::Eof) => {
                return Err(DecodeError::Empty {
                    path: path.to_string(),
                })
            }
            Err(e) => {
                return Err(DecodeError::Xml {
                    path: path.to_string(),
                    message: e.to_string(),
                })
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DUMP: &str = r#"<?xml version="1.0"?>
<mysqldump xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
  <database name="SSConfig">
    <table name="system_stat">
      <row>
        <field name="numActiveCalls">12</field>
        <field name="ha_current_state">active</field>
      </row>
    </table>
    <table name="ingress_stat">
      <row>
        <field name="trunk_id">TG1</field>
        <field name="1h_call_attempt">100</field>
        <field name="comment"/>
      </row>
      <row>
        <field name="trunk_id">TG2</field>
      </row>
    </table>
  </database>
</mysqldump>"#;

    #[test]
    fn test_shape_for_path() {
        assert_eq!(ResponseShape::for_path("stats/media_server"), ResponseShape::MediaServerList);
        assert_eq!(
            ResponseShape::for_path("download/resource"),
            ResponseShape::ResourceConfigList
        );
        assert_eq!(ResponseShape::for_path("stats/resource"), ResponseShape::Tabular);
        assert_eq!(ResponseShape::for_path("stats/realtime"), ResponseShape::Tabular);
    }

    #[test]
    fn test_decode_tabular_dump() {
        let decoded = decode("stats/resource", DUMP.as_bytes()).unwrap();
        let Decoded::Tabular(dump) = decoded else {
            panic!("Expected tabular dump");
        };

        assert_eq!(dump.database.name, "SSConfig");
        assert_eq!(dump.database.tables.len(), 2);

        let ingress = &dump.database.tables[1];
        assert_eq!(ingress.name, "ingress_stat");
        assert_eq!(ingress.rows.len(), 2);
        assert_eq!(ingress.rows[0].fields[0], Field::new("trunk_id", "TG1"));
        assert_eq!(ingress.rows[0].fields[1], Field::new("1h_call_attempt", "100"));
        assert_eq!(ingress.rows[0].fields[2], Field::new("comment", ""));
    }

    #[test]
    fn test_decode_is_idempotent() {
        let first = decode("stats/realtime", DUMP.as_bytes()).unwrap();
        let second = decode("stats/realtime", DUMP.as_bytes()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_decode_media_servers() {
        let xml = r#"<XBMediaServerRealTimeStatList>
  <XBMediaServerRealTimeStat>
    <mediaSrvIndex>1</mediaSrvIndex>
    <publicIP>192.0.2.10</publicIP>
    <maxConnections>5000</maxConnections>
    <priority>1</priority>
    <alias>ms-east</alias>
    <switchType>Sansay Media Server-VSXi</switchType>
    <status>up</status>
    <numActiveSessions>321</numActiveSessions>
  </XBMediaServerRealTimeStat>
</XBMediaServerRealTimeStatList>"#;

        let Decoded::MediaServers(servers) = decode("stats/media_server", xml.as_bytes()).unwrap()
        else {
            panic!("Expected media servers");
        };
        assert_eq!(servers.len(), 1);
        assert_eq!(servers[0].alias, "ms-east");
        assert_eq!(servers[0].public_ip, "192.0.2.10");
        assert_eq!(servers[0].active_sessions, "321");
    }

    #[test]
    fn test_decode_media_servers_with_interleaved_siblings() {
        let xml = r#"<XBMediaServerRealTimeStatList>
  <XBMediaServerRealTimeStat><alias>ms-east</alias><status>up</status></XBMediaServerRealTimeStat>
  <total>2</total>
  <XBMediaServerRealTimeStat><alias>ms-west</alias><status>down</status></XBMediaServerRealTimeStat>
</XBMediaServerRealTimeStatList>"#;

        let Decoded::MediaServers(servers) = decode("stats/media_server", xml.as_bytes()).unwrap()
        else {
            panic!("Expected media servers");
        };
        let aliases: Vec<_> = servers.iter().map(|s| s.alias.as_str()).collect();
        assert_eq!(aliases, vec!["ms-east", "ms-west"]);
    }

    #[test]
    fn test_decode_tabular_with_interleaved_siblings() {
        let xml = r#"<mysqldump>
  <database name="SSConfig">
    <table name="ingress_stat">
      <row><field name="trunk_id">TG1</field><note/><field name="1h_call_attempt">1</field></row>
      <options/>
      <row><field name="trunk_id">TG2</field></row>
    </table>
    <view name="v1"/>
    <table name="gw_egress_stat">
      <row><field name="trunk_id">TG3</field></row>
    </table>
  </database>
</mysqldump>"#;

        let Decoded::Tabular(dump) = decode("stats/resource", xml.as_bytes()).unwrap() else {
            panic!("Expected tabular dump");
        };
        let tables = &dump.database.tables;
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].rows.len(), 2);
        assert_eq!(tables[0].rows[0].fields.len(), 2);
        assert_eq!(tables[0].rows[0].fields[1], Field::new("1h_call_attempt", "1"));
        assert_eq!(tables[1].name, "gw_egress_stat");
    }

    #[test]
    fn test_decode_resource_configs_with_interleaved_siblings() {
        let xml = r#"<XBResourceList>
  <XBResource><trunkId>1</trunkId><capacity>10</capacity></XBResource>
  <count>2</count>
  <XBResource><trunkId>2</trunkId><capacity>20</capacity></XBResource>
</XBResourceList>"#;

        let Decoded::ResourceConfigs(resources) =
            decode("download/resource", xml.as_bytes()).unwrap()
        else {
            panic!("Expected resource configs");
        };
        assert_eq!(resources.len(), 2);
        assert_eq!(resources[1].trunk_id, "2");
        assert_eq!(resources[1].capacity, "20");
    }

    #[test]
    fn test_decode_resource_configs_ignores_nested_fields() {
        let xml = r#"<XBResourceList>
  <XBResource>
    <protocol>SIP</protocol>
    <typeSIPgw><portAddress>5060</portAddress></typeSIPgw>
    <name>Carrier A</name>
    <trunkId>100</trunkId>
    <capacity>500</capacity>
    <cpsLimit>20</cpsLimit>
    <node><fqdn>Group</fqdn><capacity>1</capacity><cpsLimit>2</cpsLimit></node>
  </XBResource>
</XBResourceList>"#;

        let Decoded::ResourceConfigs(resources) =
            decode("download/resource", xml.as_bytes()).unwrap()
        else {
            panic!("Expected resource configs");
        };
        assert_eq!(
            resources,
            vec![ResourceConfigRecord {
                trunk_id: "100".to_string(),
                alias: "Carrier A".to_string(),
                capacity: "500".to_string(),
                cps_limit: "20".to_string(),
            }]
        );
    }

    #[test]
    fn test_wrong_root_is_rejected() {
        let err = decode("stats/realtime", b"<xml>response</xml>").unwrap_err();
        match err {
            DecodeError::UnexpectedRoot {
                path,
                expected,
                found,
            } => {
                assert_eq!(path, "stats/realtime");
                assert_eq!(expected, "mysqldump");
                assert_eq!(found, "xml");
            }
            other => panic!("Expected UnexpectedRoot, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_document_is_rejected() {
        let err = decode("stats/media_server", b"").unwrap_err();
        assert!(matches!(err, DecodeError::Empty { .. }));
    }

    #[test]
    fn test_malformed_document_is_rejected() {
        let err = decode("stats/realtime", b"<mysqldump><database></mysqldump>").unwrap_err();
        assert!(matches!(err, DecodeError::Xml { .. }));
        assert!(err.to_string().contains("stats/realtime"));
    }
}
