//! End-to-end tests: source trees on disk through the builder into a
//! universe

use gomodel_parser::Builder;
use gomodel_test_fixtures::{init_test_tracing, GoFixture, MiniGo};
use gomodel_types::{Kind, KindTag, Name, TypeId, Universe};
use pretty_assertions::assert_eq;

const SHAPES: &str = "example.com/shapes";

const POINT_GO: &str = r#"package shapes

// Point is a location.
type Point struct {
	// X is horizontal.
	X int
	Y int `json:"y"`
}

// Dist measures from the origin.
func (p *Point) Dist() float64 { return 0 }

// Origin is the zero point.
func Origin() Point {
	return Point{}
}

var Default Point

const Scale = 2
"#;

fn build(fixture: &GoFixture, location: &str) -> Universe {
    let mut builder: Builder<MiniGo> = fixture.builder();
    builder.add_directory(location).unwrap();
    builder.find_types().unwrap()
}

fn type_id(universe: &Universe, package: &str, name: &str) -> TypeId {
    universe
        .find_type(&Name::new(package, name))
        .unwrap_or_else(|| panic!("{package}.{name} not in universe"))
}

#[test]
fn test_struct_members_share_builtin_nodes() {
    init_test_tracing();
    let fixture = GoFixture::new();
    fixture.write("example.com/shapes/point.go", POINT_GO);

    let universe = build(&fixture, SHAPES);
    let package = universe.get_package(SHAPES).unwrap();
    assert_eq!(package.name, "shapes");
    assert!(package.source_path.is_some());

    let point = &universe[type_id(&universe, SHAPES, "Point")];
    assert_eq!(point.kind.tag(), KindTag::Struct);
    assert_eq!(point.comment_lines, vec!["Point is a location."]);

    let members = point.kind.members();
    assert_eq!(members.len(), 2);
    assert_eq!(members[0].name, "X");
    assert_eq!(members[0].comment_lines, vec!["X is horizontal."]);
    assert_eq!(members[1].tags, r#"json:"y""#);
    let int = universe.find_type(&Name::builtin("int")).unwrap();
    assert_eq!(members[0].ty, int);
    assert_eq!(members[1].ty, int);
    assert_eq!(universe[int].kind, Kind::Builtin);
}

#[test]
fn test_methods_are_reached_through_their_receiver() {
    init_test_tracing();
    let fixture = GoFixture::new();
    fixture.write("example.com/shapes/point.go", POINT_GO);

    let universe = build(&fixture, SHAPES);
    let point_id = type_id(&universe, SHAPES, "Point");
    let point = &universe[point_id];

    let dist_id = point.methods["Dist"];
    let dist = &universe[dist_id];
    assert_eq!(dist.name, Name::new(SHAPES, "Point.Dist"));
    assert_eq!(dist.comment_lines, vec!["Dist measures from the origin."]);

    let signature = dist.kind.signature().unwrap();
    assert_eq!(signature.comment_lines, dist.comment_lines);
    assert_eq!(
        signature.results,
        vec![universe.find_type(&Name::builtin("float64")).unwrap()]
    );
    let receiver = &universe[signature.receiver.unwrap()];
    assert_eq!(receiver.name, Name::builtin("*example.com/shapes.Point"));
    assert_eq!(receiver.kind, Kind::Pointer { elem: point_id });

    // Methods are not top-level functions.
    let package = universe.get_package(SHAPES).unwrap();
    assert_eq!(package.functions.keys().collect::<Vec<_>>(), vec!["Origin"]);
}

#[test]
fn test_declarations_point_at_their_types() {
    init_test_tracing();
    let fixture = GoFixture::new();
    fixture.write("example.com/shapes/point.go", POINT_GO);

    let universe = build(&fixture, SHAPES);
    let package = universe.get_package(SHAPES).unwrap();
    let point_id = type_id(&universe, SHAPES, "Point");

    let origin = &universe[package.functions["Origin"]];
    assert_eq!(origin.comment_lines, vec!["Origin is the zero point."]);
    let Kind::DeclarationOf {
        underlying: Some(sig_id),
    } = origin.kind
    else {
        panic!("Origin is not a declaration: {:?}", origin.kind);
    };
    assert_eq!(universe[sig_id].kind.signature().unwrap().results, vec![point_id]);

    let default = &universe[package.variables["Default"]];
    assert_eq!(default.kind.underlying(), Some(point_id));

    let scale = &universe[package.constants["Scale"]];
    let untyped = scale.kind.underlying().unwrap();
    assert_eq!(universe[untyped].name, Name::builtin("untyped int"));
}

#[test]
fn test_named_types_flatten_or_alias() {
    init_test_tracing();
    let fixture = GoFixture::new();
    fixture.write(
        "example.com/units/units.go",
        r#"package units

type Celsius float64

type Reading Celsius

type Readings []Reading

type Index map[string]int

type Grid [3]int

type Sensor interface {
	Read() Reading
}
"#,
    );

    let universe = build(&fixture, "example.com/units");
    let pkg = "example.com/units";
    let float64 = universe.find_type(&Name::builtin("float64")).unwrap();
    let celsius = type_id(&universe, pkg, "Celsius");
    let reading = type_id(&universe, pkg, "Reading");

    assert_eq!(universe[celsius].kind, Kind::Alias { underlying: float64 });
    assert_eq!(universe[reading].kind, Kind::Alias { underlying: celsius });

    let readings = &universe[type_id(&universe, pkg, "Readings")];
    let Kind::Alias { underlying } = readings.kind else {
        panic!("Readings is not an alias: {:?}", readings.kind);
    };
    assert_eq!(universe[underlying].name, Name::builtin("[]example.com/units.Reading"));
    assert_eq!(universe[underlying].kind, Kind::Slice { elem: reading });

    let index = &universe[type_id(&universe, pkg, "Index")];
    assert_eq!(index.kind.tag(), KindTag::Alias);

    // Arrays, interfaces and structs are a single named node.
    let grid = &universe[type_id(&universe, pkg, "Grid")];
    assert_eq!(grid.kind.tag(), KindTag::Array);
    assert!(universe.find_type(&Name::builtin("[3]int")).is_none());

    let sensor_id = type_id(&universe, pkg, "Sensor");
    assert_eq!(universe[sensor_id].kind, Kind::Interface);
    let read = &universe[universe[sensor_id].methods["Read"]];
    assert_eq!(read.name, Name::new(pkg, "Sensor.Read"));
    let signature = read.kind.signature().unwrap();
    assert_eq!(signature.receiver, Some(sensor_id));
    assert_eq!(signature.results, vec![reading]);

    assert_eq!(
        universe
            .interfaces(pkg)
            .iter()
            .map(|t| t.name.name.as_str())
            .collect::<Vec<_>>(),
        vec!["Sensor"]
    );
}

#[test]
fn test_self_referential_types_terminate() {
    init_test_tracing();
    let fixture = GoFixture::new();
    fixture.write(
        "example.com/graph/graph.go",
        r#"package graph

type Node struct {
	Next *Node
	Edges []Edge
}

type Edge struct {
	From *Node
	To   *Node
}
"#,
    );

    let universe = build(&fixture, "example.com/graph");
    let pkg = "example.com/graph";
    let node = type_id(&universe, pkg, "Node");
    let edge = type_id(&universe, pkg, "Edge");

    let members = universe[node].kind.members();
    let next = &universe[members[0].ty];
    assert_eq!(next.kind, Kind::Pointer { elem: node });
    let edges = &universe[members[1].ty];
    assert_eq!(edges.kind, Kind::Slice { elem: edge });

    // One pointer node serves every `*Node` reference.
    let from = universe[edge].kind.members()[0].ty;
    let to = universe[edge].kind.members()[1].ty;
    assert_eq!(from, members[0].ty);
    assert_eq!(to, members[0].ty);
}

#[test]
fn test_comment_blocks_attach_by_distance() {
    init_test_tracing();
    let fixture = GoFixture::new();
    fixture.write(
        "example.com/docs/docs.go",
        r#"package docs

// Second block.

// Closest block.
type Thing int

// Detached.

type Lonely int

type Bare int
"#,
    );

    let universe = build(&fixture, "example.com/docs");
    let pkg = "example.com/docs";

    let thing = &universe[type_id(&universe, pkg, "Thing")];
    assert_eq!(thing.comment_lines, vec!["Closest block."]);
    assert_eq!(thing.second_closest_comment_lines, vec!["Second block."]);

    let lonely = &universe[type_id(&universe, pkg, "Lonely")];
    assert!(lonely.comment_lines.is_empty());
    assert_eq!(lonely.second_closest_comment_lines, vec!["Detached."]);

    let bare = &universe[type_id(&universe, pkg, "Bare")];
    assert!(bare.comment_lines.is_empty());
    assert!(bare.second_closest_comment_lines.is_empty());
}

#[test]
fn test_package_comments_come_from_doc_go() {
    init_test_tracing();
    let fixture = GoFixture::new();
    fixture.write(
        "example.com/documented/doc.go",
        r#"// Package documented does things.
// More text.
package documented

// Trailing note.
"#,
    );
    fixture.write(
        "example.com/documented/impl.go",
        "// Not package docs.\npackage documented\n\ntype Impl int\n",
    );

    let universe = build(&fixture, "example.com/documented");
    let package = universe.get_package("example.com/documented").unwrap();
    assert_eq!(
        package.doc_comments,
        vec!["Package documented does things.", "More text."]
    );
    assert_eq!(
        package.comments,
        vec!["Package documented does things.", "More text.", "Trailing note."]
    );
    assert!(package.has("Impl"));
}

#[test]
fn test_imported_types_appear_only_as_referenced() {
    init_test_tracing();
    let fixture = GoFixture::new();
    fixture.write(
        "example.com/lib/lib.go",
        "package lib\n\ntype ID string\n\ntype Unused struct {\n\tA int\n}\n",
    );
    fixture.write(
        "example.com/app/app.go",
        r#"package app

import "example.com/lib"

type User struct {
	ID lib.ID
}
"#,
    );

    let universe = build(&fixture, "example.com/app");
    let app = universe.get_package("example.com/app").unwrap();
    assert!(app.has_import("example.com/lib"));
    assert_eq!(
        universe
            .imports_of("example.com/app")
            .iter()
            .map(|p| p.path.as_str())
            .collect::<Vec<_>>(),
        vec!["example.com/lib"]
    );

    let lib = universe.get_package("example.com/lib").unwrap();
    assert!(lib.has("ID"));
    assert!(!lib.has("Unused"));
    // Not requested, so no package-level information.
    assert_eq!(lib.name, "");

    let id = type_id(&universe, "example.com/lib", "ID");
    let string = universe.find_type(&Name::builtin("string")).unwrap();
    assert_eq!(universe[id].kind, Kind::Alias { underlying: string });
}

#[test]
fn test_builds_are_deterministic() {
    init_test_tracing();
    let fixture = GoFixture::new();
    fixture.write("example.com/shapes/point.go", POINT_GO);
    fixture.write(
        "example.com/shapes/poly.go",
        "package shapes\n\ntype Polygon struct {\n\tPoints []Point\n\tTags map[string]string\n}\n",
    );

    let first = build(&fixture, SHAPES);
    let second = build(&fixture, SHAPES);
    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn test_relative_location_resolves_to_import_path() {
    init_test_tracing();
    let fixture = GoFixture::new();
    fixture.write("example.com/shapes/point.go", POINT_GO);

    let universe = build(&fixture, "./example.com/shapes");
    assert_eq!(universe.package_paths(), vec!["", SHAPES]);
}

#[test]
fn test_variadic_parameters_and_channels() {
    init_test_tracing();
    let fixture = GoFixture::new();
    fixture.write(
        "example.com/feed/feed.go",
        r#"package feed

type Feed struct {
	Events chan int
}

func Join(sep string, parts ...string) string {
	return sep
}
"#,
    );

    let universe = build(&fixture, "example.com/feed");
    let package = universe.get_package("example.com/feed").unwrap();
    let string = universe.find_type(&Name::builtin("string")).unwrap();
    let int = universe.find_type(&Name::builtin("int")).unwrap();

    let join = &universe[package.functions["Join"]];
    let sig_id = join.kind.underlying().unwrap();
    let signature = universe[sig_id].kind.signature().unwrap();
    assert!(signature.variadic);
    assert_eq!(signature.parameters.len(), 2);
    assert_eq!(signature.parameters[0], string);
    let parts = &universe[signature.parameters[1]];
    assert_eq!(parts.kind, Kind::Slice { elem: string });
    assert_eq!(signature.results, vec![string]);

    let feed = &universe[type_id(&universe, "example.com/feed", "Feed")];
    let events = &universe[feed.kind.members()[0].ty];
    assert_eq!(events.kind, Kind::Chan { elem: int });
}

#[test]
fn test_embedded_interface_methods_keep_declaring_interface() {
    init_test_tracing();
    let fixture = GoFixture::new();
    fixture.write(
        "example.com/io/io.go",
        r#"package io

type Reader interface {
	Read() string
}

type ReadCloser interface {
	Reader
	Close() error
}
"#,
    );

    let universe = build(&fixture, "example.com/io");
    let pkg = "example.com/io";
    let reader = type_id(&universe, pkg, "Reader");
    let read_closer = type_id(&universe, pkg, "ReadCloser");

    let read = universe[read_closer].methods["Read"];
    assert_eq!(read, universe[reader].methods["Read"]);
    assert_eq!(universe[read].name, Name::new(pkg, "Reader.Read"));
    assert_eq!(universe[read].kind.signature().unwrap().receiver, Some(reader));

    let close = &universe[universe[read_closer].methods["Close"]];
    assert_eq!(close.name, Name::new(pkg, "ReadCloser.Close"));
    assert_eq!(close.kind.signature().unwrap().receiver, Some(read_closer));
}
