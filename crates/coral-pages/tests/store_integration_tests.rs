//! Integration tests for the reactive store
//!
//! These tests verify:
//! 1. Many dispatches before a frame produce one render with the final state
//! 2. Every component bound to a store renders on that frame
//! 3. The debug switch decides whether unknown setters fail
//! 4. Snapshots cannot be used to change store state

use std::cell::RefCell;
use std::rc::Rc;

use coral_pages::prelude::*;
use rstest::{fixture, rstest};
use serde_json::{Value, json};

fn runtime_with(config: PagesConfig) -> Runtime {
	let window = Window::builder("http://localhost/")
		.body(r#"<ul id="list"></ul><p id="count"></p>"#)
		.build()
		.unwrap();
	Runtime::new(window, config)
}

#[fixture]
fn runtime() -> Runtime {
	runtime_with(PagesConfig::development())
}

fn todo_store(runtime: &Runtime) -> Store {
	Store::builder(json!({"items": []}))
		.setter("add", |state, args| {
			if let (Some(items), Some(item)) = (state["items"].as_array_mut(), args.first()) {
				items.push(item.clone());
			}
		})
		.setter("clear", |state, _| state["items"] = json!([]))
		.getter("count", |state, _| json!(state["items"].as_array().map_or(0, Vec::len)))
		.build(runtime)
}

fn list_markup(data: &Value) -> String {
	data["items"]
		.as_array()
		.into_iter()
		.flatten()
		.map(|item| format!("<li>{}</li>", item.as_str().unwrap_or_default()))
		.collect()
}

#[rstest]
fn test_dispatches_coalesce_into_one_render(runtime: Runtime) {
	// Arrange
	let store = todo_store(&runtime);
	let seen = Rc::new(RefCell::new(Vec::new()));
	let log = Rc::clone(&seen);
	let list = Component::builder("#list")
		.template(move |data, _| {
			log.borrow_mut().push(data["items"].as_array().map_or(0, Vec::len));
			list_markup(data)
		})
		.store(&store)
		.build(&runtime)
		.unwrap();

	// Act
	for item in ["a", "b", "c", "d"] {
		store.dispatch("add", &[json!(item)]).unwrap();
	}
	runtime.flush();

	// Assert
	assert_eq!(list.render_count(), 1);
	assert_eq!(*seen.borrow(), vec![4]);
	let doc = runtime.window().document();
	let ul = doc.get_element_by_id("list").unwrap();
	assert_eq!(doc.inner_html(ul), "<li>a</li><li>b</li><li>c</li><li>d</li>");
}

#[rstest]
fn test_every_bound_component_renders(runtime: Runtime) {
	// Arrange
	let store = todo_store(&runtime);
	let list = Component::builder("#list")
		.template(|data, _| list_markup(data))
		.store(&store)
		.build(&runtime)
		.unwrap();
	let count = Component::builder("#count")
		.template(|data, _| data["items"].as_array().map(Vec::len))
		.store(&store)
		.build(&runtime)
		.unwrap();

	// Act
	store.dispatch("add", &[json!("x")]).unwrap();
	runtime.flush();

	// Assert
	assert_eq!(list.render_count(), 1);
	assert_eq!(count.render_count(), 1);
	assert_eq!(store.get("count", &[]).unwrap(), json!(1));
	let doc = runtime.window().document();
	let p = doc.get_element_by_id("count").unwrap();
	assert_eq!(doc.text_content(p), "1");
}

#[rstest]
fn test_dropped_component_is_forgotten(runtime: Runtime) {
	// Arrange
	let store = todo_store(&runtime);
	let list = Component::builder("#list")
		.template(|data, _| list_markup(data))
		.store(&store)
		.build(&runtime)
		.unwrap();

	// Act
	drop(list);
	store.dispatch("add", &[json!("gone")]).unwrap();
	runtime.flush();

	// Assert
	assert!(store.components().is_empty());
	let doc = runtime.window().document();
	let ul = doc.get_element_by_id("list").unwrap();
	assert_eq!(doc.inner_html(ul), "");
}

#[rstest]
#[case(PagesConfig::development(), true)]
#[case(PagesConfig::production(), false)]
fn test_unknown_setter_policy(#[case] config: PagesConfig, #[case] fails: bool) {
	// Arrange
	let runtime = runtime_with(config);
	let store = todo_store(&runtime);

	// Act
	let result = store.dispatch("remove", &[]);

	// Assert
	assert_eq!(result.is_err(), fails);
	assert!(!store.render_pending());
}

#[rstest]
fn test_snapshot_is_detached_and_escaped(runtime: Runtime) {
	// Arrange
	let store = todo_store(&runtime);
	store.dispatch("add", &[json!("<script>")]).unwrap();

	// Act
	let mut data = store.data();
	data["items"] = json!([]);

	// Assert
	assert_eq!(store.data()["items"], json!(["&lt;script&gt;"]));
	assert_eq!(store.snapshot(true)["items"], json!(["<script>"]));
}
