use relcore::prelude::*;
use relterm::printer::print_colored;

fn main() {
    let mut model = AlloyModel::new();
    let node = model.add_signature("this/Node", Parent::TopLevel, SigFlags::ABSTRACT);
    let root = model.add_signature("this/Root", Parent::Extends(node), SigFlags::ONE);
    model.add_signature("this/Leaf", Parent::Extends(node), SigFlags::empty());
    let edges = model.add_field(node, "edges", vec![ColumnType::Sig(node)], FieldMultiplicity::Set);

    model.add_fact(
        "reachable",
        AlloyExpr::quantify(
            QuantOp::All,
            "n",
            AlloyExpr::Sig(node),
            AlloyExpr::var("n").in_(AlloyExpr::Sig(root).join(AlloyExpr::Field(edges).reflexive_closure())),
        ),
    );
    model.add_fact(
        "small",
        AlloyExpr::Sig(node).cardinality().lte(AlloyExpr::IntLiteral(4)),
    );

    let config = TranslatorConfig::load().unwrap();
    let program = translate(&model, &mut NameAllocator::new(), &config).unwrap();
    print_colored(&program).unwrap();
}
