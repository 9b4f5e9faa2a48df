//! Small programs built from the syntax tree builders, used by the command
//! line driver.

use smlcore::ast::build::*;
use smlcore::ast::Declaration;

pub struct Demo {
    pub name: &'static str,
    pub description: &'static str,
    pub program: fn() -> Vec<Declaration>,
}

pub const DEMOS: &[Demo] = &[
    Demo {
        name: "factorial",
        description: "recursive function over int",
        program: factorial,
    },
    Demo {
        name: "lists",
        description: "polymorphic map and length",
        program: lists,
    },
    Demo {
        name: "exceptions",
        description: "user exceptions, handlers and Overflow",
        program: exceptions,
    },
    Demo {
        name: "references",
        description: "ref cells and a while loop",
        program: references,
    },
    Demo {
        name: "datatypes",
        description: "a tree datatype and exhaustive matching",
        program: datatypes,
    },
];

pub fn find(name: &str) -> Option<&'static Demo> {
    DEMOS.iter().find(|demo| demo.name == name)
}

fn factorial() -> Vec<Declaration> {
    vec![
        fun(
            "fact",
            vec![
                (vec![pint(0)], int(1)),
                (
                    vec![var("n")],
                    infix("*", ident("n"), apply(ident("fact"), infix("-", ident("n"), int(1)))),
                ),
            ],
        ),
        val(var("ten"), apply(ident("fact"), int(10))),
        it(apply(ident("fact"), int(25))),
    ]
}

fn lists() -> Vec<Declaration> {
    vec![
        fun(
            "map",
            vec![
                (vec![var("f"), plist(vec![])], list(vec![])),
                (
                    vec![var("f"), pcons(var("x"), var("xs"))],
                    infix(
                        "::",
                        apply(ident("f"), ident("x")),
                        apply(apply(ident("map"), ident("f")), ident("xs")),
                    ),
                ),
            ],
        ),
        fun(
            "length",
            vec![
                (vec![plist(vec![])], int(0)),
                (
                    vec![pcons(wildcard(), var("rest"))],
                    infix("+", int(1), apply(ident("length"), ident("rest"))),
                ),
            ],
        ),
        val(
            var("squares"),
            apply(
                apply(ident("map"), lambda(vec![(var("x"), infix("*", ident("x"), ident("x")))])),
                list(vec![int(1), int(2), int(3)]),
            ),
        ),
        val(var("count"), apply(ident("length"), ident("squares"))),
    ]
}

fn exceptions() -> Vec<Declaration> {
    vec![
        exception("Negative", Some(tycon("int", vec![]))),
        fun(
            "check",
            vec![(
                vec![var("n")],
                if_then_else(
                    infix("<", ident("n"), int(0)),
                    raise(apply(ident("Negative"), ident("n"))),
                    ident("n"),
                ),
            )],
        ),
        val(
            var("recovered"),
            handle(
                apply(ident("check"), apply(ident("~"), int(4))),
                vec![(constructed("Negative", var("n")), apply(ident("~"), ident("n")))],
            ),
        ),
        it(infix("*", int(1073741823), int(4))),
    ]
}

fn references() -> Vec<Declaration> {
    vec![
        val(var("counter"), apply(ident("ref"), int(0))),
        it(while_do(
            infix("<", apply(ident("!"), ident("counter")), int(5)),
            infix(":=", ident("counter"), infix("+", apply(ident("!"), ident("counter")), int(1))),
        )),
        val(var("total"), apply(ident("!"), ident("counter"))),
    ]
}

fn datatypes() -> Vec<Declaration> {
    vec![
        datatype(
            vec!["'a"],
            "tree",
            vec![
                ("Leaf", None),
                (
                    "Node",
                    Some(tytuple(vec![
                        tycon("tree", vec![tyvar("'a")]),
                        tyvar("'a"),
                        tycon("tree", vec![tyvar("'a")]),
                    ])),
                ),
            ],
        ),
        fun(
            "size",
            vec![
                (vec![var("Leaf")], int(0)),
                (
                    vec![constructed("Node", ptuple(vec![var("l"), wildcard(), var("r")]))],
                    infix(
                        "+",
                        infix("+", apply(ident("size"), ident("l")), int(1)),
                        apply(ident("size"), ident("r")),
                    ),
                ),
            ],
        ),
        val(
            var("t"),
            apply(
                ident("Node"),
                tuple(vec![
                    ident("Leaf"),
                    int(1),
                    apply(ident("Node"), tuple(vec![ident("Leaf"), int(2), ident("Leaf")])),
                ]),
            ),
        ),
        it(apply(ident("size"), ident("t"))),
    ]
}
