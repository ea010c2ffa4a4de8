use ida2r2_core::idc::{parse_statement, recognize, Statement};

#[test]
fn recognizes_make_function_with_mixed_case_hex() {
    assert_eq!(
        parse_statement("MakeFunction    (0XF3C99,0xf3ca8);"),
        Some(Statement::FunctionRange { start: 0xF3C99, end: 0xF3CA8 })
    );
}

#[test]
fn recognizes_every_statement_shape() {
    let cases = [
        ("SetFunctionFlags(0XF3C99, 0x400);", Statement::FunctionFlags { address: 0xF3C99, flags: 0x400 }),
        (
            r#"MakeName (0XF3C99, "SIO_port_setup_S");"#,
            Statement::FunctionName { address: 0xF3C99, name: "SIO_port_setup_S".into() },
        ),
        (
            r#"SetType (0XFFF72, "__int32 __cdecl PCI_ByteWrite_SL(__int32 address, __int32 value)");"#,
            Statement::FunctionType {
                address: 0xFFF72,
                signature: "__int32 __cdecl PCI_ByteWrite_SL(__int32 address, __int32 value)".into(),
            },
        ),
        (
            r#"MakeNameEx (0xF3CA0, "return", SN_LOCAL);"#,
            Statement::LocalLabel { address: 0xF3CA0, name: "return".into() },
        ),
        (r#"id = AddStrucEx (-1, "struct_MTRR", 0);"#, Statement::Structure { name: "struct_MTRR".into() }),
        (
            r#"MakeComm (0XFED3D, "PCI class 0x600 - Host/PCI bridge");"#,
            Statement::Comment { address: 0xFED3D, text: "PCI class 0x600 - Host/PCI bridge".into() },
        ),
    ];

    for (line, expected) in cases {
        assert_eq!(parse_statement(line), Some(expected), "line: {line}");
    }
}

#[test]
fn tolerates_indentation_and_trailing_whitespace() {
    assert_eq!(
        parse_statement("\t  MakeFunction\t( 0x10 , 0x20 ) ;"),
        None,
        "space between ')' and ';' is not part of the statement shape"
    );
    assert_eq!(
        parse_statement("\t  MakeFunction\t( 0x10 , 0x20 );  \t"),
        Some(Statement::FunctionRange { start: 0x10, end: 0x20 })
    );
}

#[test]
fn strips_carriage_returns() {
    let statements = recognize("MakeFunction(0x10,0x20);\r\nMakeName(0x10,\"crlf\");\r\n");
    assert_eq!(
        statements,
        vec![
            Statement::FunctionRange { start: 0x10, end: 0x20 },
            Statement::FunctionName { address: 0x10, name: "crlf".into() },
        ]
    );
}

#[test]
fn local_labels_require_local_scope_marker() {
    assert_eq!(parse_statement(r#"MakeNameEx (0xF3CA0, "public", SN_PUBLIC);"#), None);
    // MakeName must not swallow MakeNameEx lines either.
    assert_eq!(parse_statement(r#"MakeNameEx (0xF3CA0, "x", 0);"#), None);
}

#[test]
fn rejects_hex_without_prefix_or_longer_than_eight_digits() {
    assert_eq!(parse_statement("MakeFunction(1000, 0x2000);"), None);
    assert_eq!(parse_statement("MakeFunction(0x123456789, 0x2000);"), None);
    assert_eq!(
        parse_statement("MakeFunction(0xFFFFFFFF, 0xFFFFFFFF);"),
        Some(Statement::FunctionRange { start: 0xFFFF_FFFF, end: 0xFFFF_FFFF })
    );
}

#[test]
fn statements_must_start_the_line() {
    assert_eq!(parse_statement("x = 1; MakeFunction(0x10, 0x20);"), None);
    assert_eq!(parse_statement("// MakeFunction(0x10, 0x20);"), None);
}

#[test]
fn ignores_unrelated_idc_content() {
    let idc = r#"
#include <idc.idc>

static main(void) {
    MakeFrame (0XF3C99, 0, 0, 0);
    id = GetStrucIdByName ("struct_header");
    mid = AddStructMember(id,"BCPNV", 0, 0x5000c500, 0, 7);
    MakeFunction (0XF3C99,0XF3CA8);
}
"#;
    assert_eq!(recognize(idc), vec![Statement::FunctionRange { start: 0xF3C99, end: 0xF3CA8 }]);
}

#[test]
fn string_arguments_keep_escapes_verbatim() {
    assert_eq!(
        parse_statement(r#"MakeComm (0x10, "a\nb \"q\"");"#),
        Some(Statement::Comment { address: 0x10, text: r#"a\nb \"q\""#.into() })
    );
}
