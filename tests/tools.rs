//! End-to-end tests: JSON-RPC lines in, JSON-RPC lines out, scripted database.

use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use std::io::Cursor;
use std::sync::Arc;
use vertica_mcp::config::ServerConfig;
use vertica_mcp::database::{CellValue, MockDriver, RowSet};
use vertica_mcp::protocol::{LineTransport, McpServerBuilder};
use vertica_mcp::server::{McpHandler, ServerStateBuilder};

fn lookup(vars: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
    move |key| {
        vars.iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.to_string())
    }
}

/// Answers catalog queries with fixed rows and user queries with one row.
fn warehouse() -> MockDriver {
    MockDriver::new(|sql| {
        if sql.contains("v_catalog.tables") {
            Ok(RowSet::new(
                vec!["table_schema".into(), "table_name".into()],
                ["t1", "t2"]
                    .iter()
                    .map(|name| {
                        vec![
                            CellValue::from("public"),
                            (*name).into(),
                            "TABLE".into(),
                            "f".into(),
                            "f".into(),
                            "10".into(),
                        ]
                    })
                    .collect(),
            ))
        } else if sql.contains("v_catalog.columns") {
            Ok(RowSet::new(
                vec!["column_name".into()],
                [("a", "varchar(20)", 1), ("b", "int", 2), ("c", "date", 3)]
                    .iter()
                    .map(|(name, ty, pos)| {
                        vec![
                            (*name).into(),
                            (*ty).into(),
                            CellValue::Null,
                            CellValue::Null,
                            CellValue::Null,
                            CellValue::Null,
                            "t".into(),
                            CellValue::Null,
                            CellValue::Null,
                            CellValue::Int(*pos),
                        ]
                    })
                    .collect(),
            ))
        } else if sql.starts_with("EXPLAIN") {
            Ok(RowSet::new(
                vec!["QUERY PLAN".into()],
                vec![vec!["Access Path:".into()]],
            ))
        } else {
            Ok(RowSet::new(
                vec!["id".into(), "label".into()],
                vec![vec!["1".into(), "x, y".into()], vec!["2".into(), CellValue::Null]],
            ))
        }
    })
}

async fn exchange(
    vars: &'static [(&'static str, &'static str)],
    driver: MockDriver,
    requests: &[Value],
) -> Vec<Value> {
    let config = ServerConfig::from_lookup(lookup(vars)).unwrap();
    let state = ServerStateBuilder::new()
        .config(config)
        .driver(Arc::new(driver))
        .build()
        .unwrap();

    let input: String = requests.iter().map(|r| format!("{r}\n")).collect();
    let (client, server_io) = tokio::io::duplex(1 << 20);
    let (_, writer) = tokio::io::split(server_io);
    let transport = Arc::new(LineTransport::new(Cursor::new(input.into_bytes()), writer));

    McpServerBuilder::new()
        .handler(McpHandler::new(Arc::new(state)))
        .build()
        .unwrap()
        .run_with_transport(transport)
        .await
        .unwrap();

    let mut output = String::new();
    let mut client = client;
    tokio::io::AsyncReadExt::read_to_string(&mut client, &mut output)
        .await
        .unwrap();
    output
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

fn call(id: i64, name: &str, arguments: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": "tools/call",
        "params": {"name": name, "arguments": arguments}
    })
}

fn tool_text(response: &Value) -> &str {
    response["result"]["content"][0]["text"].as_str().unwrap()
}

const BASE: &[(&str, &str)] = &[("DB_CONNECTION_STRING", "vertica://dbadmin:pw@localhost/analytics")];

#[tokio::test]
async fn lists_all_tools() {
    let responses = exchange(
        BASE,
        warehouse(),
        &[json!({"jsonrpc": "2.0", "id": 1, "method": "tools/list"})],
    )
    .await;

    let names: Vec<&str> = responses[0]["result"]["tools"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect();
    assert_eq!(
        names,
        vec![
            "describe_table",
            "execute_query",
            "explain_query",
            "export_query_results",
            "generate_sample_queries",
            "list_projections",
            "list_tables",
            "list_views",
        ]
    );
}

#[tokio::test]
async fn execute_query_gates_and_limits() {
    let driver = warehouse();
    let responses = exchange(
        &[
            ("DB_CONNECTION_STRING", "localhost:5433/analytics"),
            ("QUERY_LIMIT_SIZE", "25"),
        ],
        driver.clone(),
        &[
            call(1, "execute_query", json!({"sql": "SELECT * FROM t"})),
            call(2, "execute_query", json!({"sql": "DROP TABLE t"})),
            call(3, "execute_query", json!({"sql": "INSERT INTO t VALUES (1)"})),
            call(4, "execute_query", json!({"sql": "SELECT * FROM t -- DROP TABLE x"})),
            call(5, "execute_query", json!({"sql": "SELECT * FROM t LIMIT 5"})),
        ],
    )
    .await;

    let first: Value = serde_json::from_str(tool_text(&responses[0])).unwrap();
    assert_eq!(first["query"], "SELECT * FROM t LIMIT 25");
    assert_eq!(first["rows"], json!([["1", "x, y"], ["2", null]]));

    for response in &responses[1..3] {
        assert_eq!(response["result"]["isError"], true);
        assert_eq!(
            tool_text(response),
            "Error: Only SELECT, DESCRIBE, and EXPLAIN statements are allowed"
        );
    }

    assert!(responses[3]["result"].get("isError").is_none());
    assert_eq!(
        driver.queries(),
        vec![
            "SELECT * FROM t LIMIT 25",
            "SELECT * FROM t -- DROP TABLE x LIMIT 25",
            "SELECT * FROM t LIMIT 5",
        ]
    );
    assert_eq!(driver.opened(), driver.closed());
}

#[tokio::test]
async fn allow_lists_filter_catalog_results() {
    let responses = exchange(
        &[
            ("DB_CONNECTION_STRING", "localhost/analytics"),
            ("TABLE_WHITE_LIST", "t1"),
            ("COLUMN_WHITE_LIST", "t1.a,t1.c"),
        ],
        warehouse(),
        &[
            call(1, "list_tables", json!({})),
            call(2, "describe_table", json!({"table_name": "t1"})),
        ],
    )
    .await;

    let tables: Value = serde_json::from_str(tool_text(&responses[0])).unwrap();
    let names: Vec<&str> = tables["tables"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["table_name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["t1"]);

    let described: Value = serde_json::from_str(tool_text(&responses[1])).unwrap();
    let columns: Vec<&str> = described["columns"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["column_name"].as_str().unwrap())
        .collect();
    assert_eq!(columns, vec!["a", "c"]);
    assert_eq!(described["column_count"], 2);
}

#[tokio::test]
async fn export_and_samples() {
    let responses = exchange(
        BASE,
        warehouse(),
        &[
            call(1, "export_query_results", json!({"sql": "SELECT id, label FROM t", "format": "csv"})),
            call(2, "generate_sample_queries", json!({"table_name": "t1", "schema_name": "public"})),
            call(3, "explain_query", json!({"sql": "SELECT 1"})),
        ],
    )
    .await;

    assert_eq!(
        tool_text(&responses[0]),
        "CSV Export (2 rows):\n\nid,label\n1,\"x, y\"\n2,"
    );

    let samples: Value = serde_json::from_str(tool_text(&responses[1])).unwrap();
    assert_eq!(samples["table_name"], "t1");
    let queries = samples["sample_queries"].as_array().unwrap();
    assert_eq!(queries.len(), 5);
    assert!(queries[2].as_str().unwrap().contains("SELECT DISTINCT a FROM public.t1"));
    assert!(queries[3].as_str().unwrap().contains("AVG(b)"));
    assert!(queries[4].as_str().unwrap().starts_with("-- Date range for c"));

    let plan: Value = serde_json::from_str(tool_text(&responses[2])).unwrap();
    assert_eq!(plan, json!({"execution_plan": [{"plan_line": "Access Path:"}]}));
}

#[tokio::test]
async fn resources_list_and_read() {
    let responses = exchange(
        BASE,
        warehouse(),
        &[
            json!({"jsonrpc": "2.0", "id": 1, "method": "resources/list"}),
            json!({
                "jsonrpc": "2.0",
                "id": 2,
                "method": "resources/read",
                "params": {"uri": "vertica://table/public.t1"}
            }),
            json!({
                "jsonrpc": "2.0",
                "id": 3,
                "method": "resources/read",
                "params": {"uri": "vertica://elsewhere"}
            }),
        ],
    )
    .await;

    let uris: Vec<&str> = responses[0]["result"]["resources"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["uri"].as_str().unwrap())
        .collect();
    assert_eq!(
        uris,
        vec![
            "vertica://schema/overview",
            "vertica://table/public.t1",
            "vertica://table/public.t2",
        ]
    );

    let content = &responses[1]["result"]["contents"][0];
    assert_eq!(content["mimeType"], "application/json");
    let table: Value = serde_json::from_str(content["text"].as_str().unwrap()).unwrap();
    assert_eq!(table["schema_name"], "public");
    assert_eq!(table["column_count"], 3);

    assert_eq!(responses[2]["error"]["code"], -32602);
}

#[tokio::test]
async fn unreachable_database_reports_tool_error() {
    let driver = MockDriver::unreachable("could not connect to server: Connection refused");
    let responses = exchange(BASE, driver, &[call(1, "list_views", json!({}))]).await;

    assert_eq!(responses[0]["result"]["isError"], true);
    assert_eq!(
        tool_text(&responses[0]),
        "Error: Connection failed: could not connect to server: Connection refused"
    );
}
